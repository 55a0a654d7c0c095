use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use redmine_api::Body;
use serde::Serialize;
use tracing::warn;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// Compact single-line JSON
    Raw,
}

pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Text for a decoded body, `None` when there is nothing to print.
    pub fn format_body(&self, body: &Body) -> Result<Option<String>> {
        match body {
            Body::Json(value) => self.format_value(value).map(Some),
            Body::Xml(element) => self.format_value(element).map(Some),
            Body::Text(text) => Ok(Some(text.clone())),
            // Written as raw bytes by `render`.
            Body::Binary(_) => Ok(None),
            Body::Malformed(err) => {
                warn!(
                    line = err.line,
                    column = err.column,
                    "Response body is not valid JSON: {err}"
                );
                Ok(None)
            }
            Body::Empty => Ok(None),
        }
    }

    pub fn render(&self, body: &Body) -> Result<()> {
        if let Body::Binary(bytes) = body {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            return Ok(());
        }
        if let Some(text) = self.format_body(body)? {
            println!("{}", text.trim_end());
        }
        Ok(())
    }

    pub fn render_value<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.format_value(value)?.trim_end());
        Ok(())
    }

    fn format_value<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Raw => serde_json::to_string(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redmine_api::XmlElement;
    use serde_json::json;

    #[test]
    fn test_json_output() {
        let renderer = OutputRenderer::new(OutputFormat::Json);
        let text = renderer
            .format_body(&Body::Json(json!({"issue": {"id": 1}})))
            .unwrap()
            .unwrap();
        assert!(text.contains("\"issue\": {"));
    }

    #[test]
    fn test_raw_output() {
        let renderer = OutputRenderer::new(OutputFormat::Raw);
        let text = renderer
            .format_body(&Body::Json(json!({"id": 1})))
            .unwrap()
            .unwrap();
        assert_eq!(text, r#"{"id":1}"#);
    }

    #[test]
    fn test_yaml_output_for_xml() {
        let renderer = OutputRenderer::new(OutputFormat::Yaml);
        let element = XmlElement::parse("<user><login>jsmith</login></user>").unwrap();
        let text = renderer.format_body(&Body::Xml(element)).unwrap().unwrap();
        assert!(text.contains("name: user"));
        assert!(text.contains("text: jsmith"));
    }

    #[test]
    fn test_text_is_printed_verbatim() {
        let renderer = OutputRenderer::new(OutputFormat::Yaml);
        let text = renderer
            .format_body(&Body::Text("plain".to_string()))
            .unwrap();
        assert_eq!(text.as_deref(), Some("plain"));
    }

    #[test]
    fn test_binary_is_not_formatted() {
        let renderer = OutputRenderer::new(OutputFormat::Json);
        let body = Body::Binary(vec![0x89, 0xFF]);
        assert!(renderer.format_body(&body).unwrap().is_none());
    }

    #[test]
    fn test_empty_prints_nothing() {
        let renderer = OutputRenderer::new(OutputFormat::Json);
        assert!(renderer.format_body(&Body::Empty).unwrap().is_none());
    }
}
