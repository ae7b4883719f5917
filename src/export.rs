//! Export of conversations to Markdown and paginated documents.
//!
//! Nothing is written to the target path until the full payload exists, and
//! the final write goes through a temporary file in the same directory that
//! is renamed into place.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::observability::{EXPORTS, EXPORT_ERRORS};
use crate::types::{Message, Role};
use crate::utils::time::{display_utc, file_stamp, from_rfc3339, to_rfc3339};

const MARKER_PREFIX: &str = "<!-- groqchat:message ";
const MARKER_SUFFIX: &str = " -->";
const MARKER_ESCAPE: char = '\\';

/// Output format of an export.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    /// Markdown text.
    Markdown,
    /// PDF produced by a [`DocumentRenderer`].
    Pdf,
}

impl ExportFormat {
    /// Returns the file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(Error::validation(
                format!("unknown export format '{s}' (expected markdown or pdf)"),
                Some("format".to_string()),
            )),
        }
    }
}

/// A message read back from an exported Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedMessage {
    /// Author of the message.
    pub role: Role,
    /// Message body as it was stored.
    pub content: String,
    /// Creation time recorded in the message marker.
    pub created_at: OffsetDateTime,
}

impl From<&Message> for ExportedMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// Renders `messages` as a Markdown document, oldest first, separators excluded.
///
/// Each message is preceded by an HTML comment carrying its role and exact
/// timestamp so that [`parse_markdown`] can read the document back. Content
/// lines that look like such a comment are escaped with a backslash.
pub fn render_markdown(messages: &[Message], exported_at: OffsetDateTime) -> Result<String> {
    let mut out = String::new();
    out.push_str("# Conversation export\n\n");
    out.push_str(&format!("_Exported {}_\n\n", display_utc(exported_at)));
    for message in messages.iter().filter(|m| !m.is_separator()) {
        out.push_str(&format!(
            "{MARKER_PREFIX}role={} created_at={}{MARKER_SUFFIX}\n",
            message.role,
            to_rfc3339(message.created_at)?
        ));
        out.push_str(&format!("## {}\n", message.role.label()));
        out.push_str(&format!("_{}_\n\n", display_utc(message.created_at)));
        for (i, line) in message.content.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if is_marker_like(line) {
                out.push(MARKER_ESCAPE);
            }
            out.push_str(line);
        }
        out.push_str("\n\n");
    }
    Ok(out)
}

/// Reads back the messages of a document produced by [`render_markdown`].
///
/// Trailing newlines of each message body are not preserved.
pub fn parse_markdown(text: &str) -> Result<Vec<ExportedMessage>> {
    let mut messages = Vec::new();
    let mut current: Option<(Role, OffsetDateTime, Vec<&str>)> = None;
    for line in text.split('\n') {
        let marker = line
            .strip_prefix(MARKER_PREFIX)
            .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX));
        if let Some(attributes) = marker {
            if let Some(block) = current.take() {
                messages.push(finish_block(block)?);
            }
            let (role, created_at) = parse_marker(attributes)?;
            current = Some((role, created_at, Vec::new()));
        } else if let Some((_, _, lines)) = current.as_mut() {
            match line.strip_prefix(MARKER_ESCAPE) {
                Some(escaped) if is_marker_like(escaped) => lines.push(escaped),
                _ => lines.push(line),
            }
        }
    }
    if let Some(block) = current {
        messages.push(finish_block(block)?);
    }
    Ok(messages)
}

/// Content lines that could be read as a marker, including ones already
/// escaped, get one more [`MARKER_ESCAPE`] in the document.
fn is_marker_like(line: &str) -> bool {
    line.trim_start_matches(MARKER_ESCAPE).starts_with(MARKER_PREFIX)
}

fn parse_marker(attributes: &str) -> Result<(Role, OffsetDateTime)> {
    let mut role = None;
    let mut created_at = None;
    for pair in attributes.split_whitespace() {
        match pair.split_once('=') {
            Some(("role", value)) => role = Some(Role::from_str(value)?),
            Some(("created_at", value)) => created_at = Some(from_rfc3339(value)?),
            _ => {}
        }
    }
    match (role, created_at) {
        (Some(role), Some(created_at)) => Ok((role, created_at)),
        _ => Err(Error::export(
            format!("malformed message marker: {attributes}"),
            None,
        )),
    }
}

fn finish_block((role, created_at, lines): (Role, OffsetDateTime, Vec<&str>)) -> Result<ExportedMessage> {
    // heading, timestamp line, blank line, then the body
    if lines.len() < 3 || !lines[0].starts_with("## ") {
        return Err(Error::export(
            format!("malformed {role} message block in export"),
            None,
        ));
    }
    let content = lines[3..].join("\n").trim_end_matches('\n').to_string();
    Ok(ExportedMessage {
        role,
        content,
        created_at,
    })
}

/// Converts Markdown text into a binary document.
#[async_trait::async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Produces the whole document for `markdown`.
    async fn render(&self, markdown: &str) -> Result<Vec<u8>>;
}

/// Renders PDFs with an external `pandoc` binary.
#[derive(Debug, Clone)]
pub struct PandocRenderer {
    program: PathBuf,
}

impl Default for PandocRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
        }
    }
}

impl PandocRenderer {
    /// Uses the `pandoc` found at `program` instead of the one on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentRenderer for PandocRenderer {
    async fn render(&self, markdown: &str) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()
            .map_err(|e| Error::export("cannot create scratch directory", Some(Box::new(e))))?;
        let input = scratch.path().join("conversation.md");
        let output = scratch.path().join("conversation.pdf");
        tokio::fs::write(&input, markdown)
            .await
            .map_err(|e| Error::export("cannot stage markdown for pandoc", Some(Box::new(e))))?;

        let result = tokio::process::Command::new(&self.program)
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::export(
                        format!(
                            "pandoc not found at '{}'; install pandoc to export PDF",
                            self.program.display()
                        ),
                        Some(Box::new(e)),
                    )
                } else {
                    Error::export("cannot run pandoc", Some(Box::new(e)))
                }
            })?;
        if !result.status.success() {
            return Err(Error::export(
                format!(
                    "pandoc failed ({}): {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
                None,
            ));
        }
        tokio::fs::read(&output)
            .await
            .map_err(|e| Error::export("pandoc produced no document", Some(Box::new(e))))
    }
}

/// Writes `contents` to `path` through a temporary file renamed into place.
///
/// On failure the target is left as it was and no temporary file remains.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| {
        Error::export(
            format!("cannot create export directory {}", parent.display()),
            Some(Box::new(e)),
        )
    })?;
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        Error::export(
            format!("cannot create temporary file in {}", parent.display()),
            Some(Box::new(e)),
        )
    })?;
    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| {
            Error::export(
                format!("cannot write {}", path.display()),
                Some(Box::new(e)),
            )
        })?;
    temp.persist(path).map_err(|e| {
        Error::export(
            format!("cannot move export into place at {}", path.display()),
            Some(Box::new(e.error)),
        )
    })?;
    Ok(())
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Where the export was written.
    pub path: PathBuf,
    /// Format of the written file.
    pub format: ExportFormat,
    /// Number of user and assistant messages exported.
    pub messages: usize,
    /// Size of the written file.
    pub bytes: usize,
}

/// Writes exports into a directory.
#[derive(Debug, Clone)]
pub struct Exporter<R = PandocRenderer> {
    dir: PathBuf,
    renderer: R,
}

impl Exporter<PandocRenderer> {
    /// Creates an exporter writing into `dir` that renders PDFs with pandoc.
    pub fn with_pandoc(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, PandocRenderer::default())
    }
}

impl<R: DocumentRenderer> Exporter<R> {
    /// Creates an exporter writing into `dir` that renders documents with `renderer`.
    ///
    /// The directory is created on the first export.
    pub fn new(dir: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            dir: dir.into(),
            renderer,
        }
    }

    /// Returns the directory exports are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path an export named `name` would be written to.
    ///
    /// Without a name the stem is `chat_export_YYYYMMDD_HHMMSS`. Only the file
    /// name of `name` is used and a trailing `.md` or `.pdf` is dropped.
    pub fn target_path(&self, name: Option<&str>, format: ExportFormat, now: OffsetDateTime) -> PathBuf {
        let stem = name
            .and_then(|name| Path::new(name.trim()).file_name())
            .and_then(|name| name.to_str())
            .map(|name| {
                name.strip_suffix(".md")
                    .or_else(|| name.strip_suffix(".pdf"))
                    .unwrap_or(name)
                    .to_string()
            })
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| format!("chat_export_{}", file_stamp(now)));
        self.dir.join(format!("{stem}.{}", format.extension()))
    }

    /// Exports `messages` in `format`.
    pub async fn export(
        &self,
        messages: &[Message],
        format: ExportFormat,
        name: Option<&str>,
    ) -> Result<ExportReport> {
        let result = self.export_inner(messages, format, name).await;
        match &result {
            Ok(report) => {
                EXPORTS.click();
                info!(path = %report.path.display(), format = %format, messages = report.messages, "exported conversation");
            }
            Err(err) => {
                EXPORT_ERRORS.click();
                warn!(error = %err, format = %format, "export failed");
            }
        }
        result
    }

    async fn export_inner(
        &self,
        messages: &[Message],
        format: ExportFormat,
        name: Option<&str>,
    ) -> Result<ExportReport> {
        let count = messages.iter().filter(|m| !m.is_separator()).count();
        if count == 0 {
            return Err(Error::validation(
                "there are no messages to export",
                Some("messages".to_string()),
            ));
        }
        let now = OffsetDateTime::now_utc();
        let markdown = render_markdown(messages, now)?;
        let payload = match format {
            ExportFormat::Markdown => markdown.into_bytes(),
            ExportFormat::Pdf => self.renderer.render(&markdown).await?,
        };
        let path = self.target_path(name, format, now);
        write_atomic(&path, &payload)?;
        Ok(ExportReport {
            path,
            format,
            messages: count,
            bytes: payload.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn message(id: i64, role: Role, content: &str, created_at: OffsetDateTime) -> Message {
        Message {
            id,
            role,
            content: content.to_string(),
            created_at,
        }
    }

    fn sample() -> Vec<Message> {
        vec![
            message(1, Role::Separator, "--- NEW CONVERSATION STARTED: 2025-02-01 09:59:00 UTC ---", datetime!(2025-02-01 09:59:00 UTC)),
            message(2, Role::User, "How do I read a file?", datetime!(2025-02-01 10:00:00 UTC)),
            message(
                3,
                Role::Assistant,
                "Use `std::fs::read_to_string`:\n\n```rust\nlet s = std::fs::read_to_string(\"a.txt\")?;\n```\n\n## Notes\nIt returns a `Result`.",
                datetime!(2025-02-01 10:00:05.250 UTC),
            ),
        ]
    }

    struct StaticRenderer(Vec<u8>);

    #[async_trait::async_trait]
    impl DocumentRenderer for StaticRenderer {
        async fn render(&self, _: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingRenderer;

    #[async_trait::async_trait]
    impl DocumentRenderer for FailingRenderer {
        async fn render(&self, _: &str) -> Result<Vec<u8>> {
            Err(Error::export("renderer unavailable", None))
        }
    }

    #[test]
    fn markdown_round_trip() {
        let messages = sample();
        let text = render_markdown(&messages, datetime!(2025-02-02 00:00:00 UTC)).unwrap();
        let parsed = parse_markdown(&text).unwrap();
        let expected: Vec<ExportedMessage> = messages
            .iter()
            .filter(|m| !m.is_separator())
            .map(ExportedMessage::from)
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn pasted_export_in_content_stays_one_message() {
        let pasted = "Here is my old export:\n\
<!-- groqchat:message role=assistant created_at=2025-01-01T00:00:00Z -->\n\
## Assistant\n\
_2025-01-01 00:00:00 UTC_\n\
\n\
quoted\n\
\\<!-- groqchat:message role=user created_at=2025-01-01T00:00:00Z -->";
        let messages = vec![message(7, Role::User, pasted, datetime!(2025-03-01 08:00:00 UTC))];
        let text = render_markdown(&messages, datetime!(2025-03-02 00:00:00 UTC)).unwrap();
        assert!(text.contains("\n\\<!-- groqchat:message role=assistant"));

        let parsed = parse_markdown(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].role, Role::User);
        assert_eq!(parsed[0].content, pasted);
    }

    #[test]
    fn markdown_excludes_separators_and_labels_roles() {
        let text = render_markdown(&sample(), datetime!(2025-02-02 00:00:00 UTC)).unwrap();
        assert!(!text.contains("NEW CONVERSATION STARTED"));
        assert!(text.contains("## User\n_2025-02-01 10:00:00 UTC_\n\nHow do I read a file?"));
        assert!(text.contains("## Assistant\n"));
        assert!(text.starts_with("# Conversation export\n\n_Exported 2025-02-02 00:00:00 UTC_"));
        let user = text.find("## User").unwrap();
        let assistant = text.find("## Assistant").unwrap();
        assert!(user < assistant);
    }

    #[test]
    fn malformed_marker_is_an_export_error() {
        let err = parse_markdown("<!-- groqchat:message role=user -->\n## User\n_x_\n\nhi\n").unwrap_err();
        assert!(err.is_export());
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!("markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().unwrap_err().is_validation());
    }

    #[test]
    fn target_path_defaults_and_strips_extensions() {
        let exporter = Exporter::new("exports", FailingRenderer);
        let now = datetime!(2025-02-01 10:11:12 UTC);
        assert_eq!(
            exporter.target_path(None, ExportFormat::Markdown, now),
            PathBuf::from("exports/chat_export_20250201_101112.md")
        );
        assert_eq!(
            exporter.target_path(Some("notes.md"), ExportFormat::Pdf, now),
            PathBuf::from("exports/notes.pdf")
        );
        assert_eq!(
            exporter.target_path(Some("../../etc/passwd"), ExportFormat::Markdown, now),
            PathBuf::from("exports/passwd.md")
        );
    }

    #[tokio::test]
    async fn markdown_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"), FailingRenderer);
        let report = exporter
            .export(&sample(), ExportFormat::Markdown, Some("session"))
            .await
            .unwrap();

        assert_eq!(report.path, dir.path().join("exports/session.md"));
        assert_eq!(report.messages, 2);
        let written = std::fs::read_to_string(&report.path).unwrap();
        assert_eq!(written.len(), report.bytes);
        assert_eq!(parse_markdown(&written).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pdf_export_writes_rendered_payload() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), StaticRenderer(b"%PDF-1.7 fake".to_vec()));
        let report = exporter
            .export(&sample(), ExportFormat::Pdf, None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&report.path).unwrap(), b"%PDF-1.7 fake");
        assert_eq!(report.path.extension().unwrap(), "pdf");
    }

    #[tokio::test]
    async fn failed_render_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), FailingRenderer);
        let err = exporter
            .export(&sample(), ExportFormat::Pdf, Some("broken"))
            .await
            .unwrap_err();
        assert!(err.is_export());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_pandoc_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(
            dir.path(),
            PandocRenderer::with_program(dir.path().join("no-such-pandoc")),
        );
        let err = exporter
            .export(&sample(), ExportFormat::Pdf, Some("out"))
            .await
            .unwrap_err();
        assert!(err.is_export());
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn empty_conversation_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), FailingRenderer);
        let only_separator = vec![sample().remove(0)];
        let err = exporter
            .export(&only_separator, ExportFormat::Markdown, None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        std::fs::write(&path, "old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
