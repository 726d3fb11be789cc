//! Helpers for the external OCR and rasterization binaries.

use std::process::{Command, ExitStatus, Output};

use crate::error::{OcrError, PdfError};

/// Outcome of running an external tool that did not succeed.
#[derive(Debug)]
pub(crate) enum ToolFailure {
    /// The binary is not on `PATH`.
    NotFound(String),
    /// The binary ran and exited non-zero.
    Failed(String),
    /// Spawning failed for another reason.
    Io(std::io::Error),
}

impl From<ToolFailure> for OcrError {
    fn from(failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::NotFound(tool) => OcrError::ToolNotFound(tool),
            ToolFailure::Failed(msg) => OcrError::Recognition(msg),
            ToolFailure::Io(e) => OcrError::Io(e),
        }
    }
}

impl From<ToolFailure> for PdfError {
    fn from(failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::NotFound(tool) => PdfError::ToolNotFound(tool),
            ToolFailure::Failed(msg) => PdfError::Rasterize(msg),
            ToolFailure::Io(e) => PdfError::Io(e),
        }
    }
}

/// Extract stdout on success, or classify the failure.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ToolFailure> {
    match result {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout).to_string()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ToolFailure::Failed(format!("{}: {}", error_prefix, stderr.trim())))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolFailure::NotFound(tool_name.to_string())),
        Err(e) => Err(ToolFailure::Io(e)),
    }
}

/// Check an exit status, classifying the failure.
pub(crate) fn check_cmd_status(
    result: std::io::Result<ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), ToolFailure> {
    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(ToolFailure::Failed(format!("{} ({})", error_msg, status))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolFailure::NotFound(tool_name.to_string())),
        Err(e) => Err(ToolFailure::Io(e)),
    }
}

/// Whether a binary can be found on `PATH`.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Availability of every external tool the pipeline can use.
pub fn check_tools() -> Vec<(String, bool)> {
    ["tesseract", "pdftoppm"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools_lists_both_binaries() {
        let tools = check_tools();
        let names: Vec<&str> = tools.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["tesseract", "pdftoppm"]);
    }

    #[test]
    fn test_missing_binary() {
        let result = Command::new("smartbooks-no-such-tool").output();
        let failure = handle_cmd_output(result, "smartbooks-no-such-tool", "failed").unwrap_err();
        assert!(matches!(failure, ToolFailure::NotFound(ref name) if name == "smartbooks-no-such-tool"));
        assert!(matches!(OcrError::from(failure), OcrError::ToolNotFound(_)));
    }

    #[test]
    fn test_failure_maps_per_concern() {
        let pdf: PdfError = ToolFailure::Failed("bad".to_string()).into();
        assert!(matches!(pdf, PdfError::Rasterize(_)));

        let ocr: OcrError = ToolFailure::Failed("bad".to_string()).into();
        assert!(matches!(ocr, OcrError::Recognition(_)));
    }
}
