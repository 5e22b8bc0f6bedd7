use crate::errors::ServiceError;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::{process::Stdio, time::Instant};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::{error, instrument};

/// Turns rendered HTML into PDF bytes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Pipes HTML through an external converter: HTML on stdin, PDF on stdout
/// (`weasyprint - -` by default).
#[derive(Debug, Clone)]
pub struct CommandPdfEngine {
    program: String,
    args: Vec<String>,
}

impl CommandPdfEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

const STDERR_LIMIT: usize = 512;

/// First `STDERR_LIMIT` characters of the converter's stderr
fn stderr_excerpt(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim()
        .chars()
        .take(STDERR_LIMIT)
        .collect()
}

#[async_trait]
impl PdfEngine for CommandPdfEngine {
    #[instrument(skip(self, html), fields(program = %self.program, html_len = html.len()))]
    async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, ServiceError> {
        let start = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(error = %e, "PDF converter could not be started");
                counter!("bizdesk.pdf.failures", 1);
                ServiceError::RenderError(format!("failed to start {}: {}", self.program, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ServiceError::RenderError("converter stdin unavailable".into()))?;
        let input = html.as_bytes().to_vec();
        // Feed stdin while stdout is drained, or a large document deadlocks
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ServiceError::RenderError(format!("converter failed: {}", e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if output.status.success() => {
                return Err(ServiceError::RenderError(format!(
                    "writing to converter failed: {}",
                    e
                )))
            }
            Ok(Err(_)) => {}
            Err(e) => return Err(ServiceError::RenderError(format!("stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = stderr_excerpt(&output.stderr);
            error!(status = %output.status, stderr = %stderr, "PDF conversion failed");
            counter!("bizdesk.pdf.failures", 1);
            return Err(ServiceError::RenderError(format!(
                "{} exited with {}: {}",
                self.program, output.status, stderr
            )));
        }

        if output.stdout.is_empty() {
            counter!("bizdesk.pdf.failures", 1);
            return Err(ServiceError::RenderError(format!(
                "{} produced no output",
                self.program
            )));
        }

        counter!("bizdesk.pdf.rendered", 1);
        histogram!("bizdesk.pdf.render_duration", start.elapsed());
        Ok(output.stdout)
    }
}
