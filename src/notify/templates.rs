//! Email body templates.

use std::fs;
use std::path::{Path, PathBuf};

use crate::notify::{NotificationKind, Notice};
use crate::store::format_timestamp;

const TARGET_PLACEHOLDER: &str = "{{target}}";
const TIMESTAMP_PLACEHOLDER: &str = "{{timestamp}}";

#[derive(Debug, thiserror::Error)]
#[error("failed to load {kind} email template {}: {source}", path.display())]
pub struct TemplateError {
    pub kind: NotificationKind,
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// The two HTML bodies, one per notification kind.
#[derive(Debug, Clone)]
pub struct Templates {
    alert: String,
    restored: String,
}

impl Templates {
    pub fn new(alert: impl Into<String>, restored: impl Into<String>) -> Self {
        Self {
            alert: alert.into(),
            restored: restored.into(),
        }
    }

    pub fn load(alert_path: &Path, restored_path: &Path) -> Result<Self, TemplateError> {
        let read = |kind, path: &Path| {
            fs::read_to_string(path).map_err(|source| TemplateError {
                kind,
                path: path.to_path_buf(),
                source,
            })
        };

        let alert = read(NotificationKind::Alert, alert_path)?;
        let restored = read(NotificationKind::Restored, restored_path)?;
        Ok(Self { alert, restored })
    }

    /// Render the body for a notice.
    pub fn render(&self, notice: &Notice) -> String {
        let template = match notice.kind {
            NotificationKind::Alert => &self.alert,
            NotificationKind::Restored => &self.restored,
        };

        template
            .replace(TARGET_PLACEHOLDER, &notice.target)
            .replace(TIMESTAMP_PLACEHOLDER, &format_timestamp(notice.at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn notice(kind: NotificationKind) -> Notice {
        Notice {
            kind,
            target: "10.1.1.1:22".into(),
            at: chrono::Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 0).unwrap(),
        }
    }

    #[test]
    fn renders_placeholders_per_kind() {
        let templates = Templates::new(
            "<p>{{target}} down since {{timestamp}}</p>",
            "<p>{{target}} back at {{timestamp}}</p>",
        );

        assert_eq!(
            templates.render(&notice(NotificationKind::Alert)),
            "<p>10.1.1.1:22 down since 2024-03-09 08:05:00 UTC</p>"
        );
        assert_eq!(
            templates.render(&notice(NotificationKind::Restored)),
            "<p>10.1.1.1:22 back at 2024-03-09 08:05:00 UTC</p>"
        );
    }

    #[test]
    fn load_reads_both_files() {
        let mut alert = tempfile::NamedTempFile::new().unwrap();
        let mut restored = tempfile::NamedTempFile::new().unwrap();
        alert.write_all(b"down {{target}}").unwrap();
        restored.write_all(b"up {{target}}").unwrap();

        let templates = Templates::load(alert.path(), restored.path()).unwrap();
        assert_eq!(templates.render(&notice(NotificationKind::Restored)), "up 10.1.1.1:22");
    }

    #[test]
    fn missing_file_names_the_template() {
        let restored = tempfile::NamedTempFile::new().unwrap();
        let err = Templates::load(Path::new("/nonexistent/alert.html"), restored.path()).unwrap_err();
        assert_eq!(err.kind, NotificationKind::Alert);
    }
}
