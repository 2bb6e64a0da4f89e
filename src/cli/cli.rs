use tracing::{info, warn};

use crate::config::Config;
use crate::ledger::store::JsonFileStore;
use crate::mailer::{DisabledSender, MailSender, MailgunConfig, MailgunSender};
use crate::mapping::FieldMapper;
use crate::models::{App, Result};
use crate::submissions::{load_history_source, SubmissionSource};

#[derive(Debug, Clone)]
pub enum MenuAction {
    RunDigest,
    GenerateSingle,
    SendSingle,
    GenerateSplit,
    SendSplit,
    ExportAll,
    Backfill,
    Cleanup,
    ResetLedger,
    ShowStatus,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::RunDigest => write!(f, "🕐 Run scheduled digest now"),
            MenuAction::GenerateSingle => write!(f, "📄 Generate CSV (no email)"),
            MenuAction::SendSingle => write!(f, "📧 Send CSV now (email)"),
            MenuAction::GenerateSplit => write!(f, "📄 Generate 2 CSVs (private/business)"),
            MenuAction::SendSplit => write!(f, "📧 Send 2 CSVs now (private/business)"),
            MenuAction::ExportAll => write!(f, "🗃️  Export ALL (ignore exported flags)"),
            MenuAction::Backfill => write!(f, "⏪ Import history (backfill)"),
            MenuAction::Cleanup => write!(f, "🧹 Run cleanup now"),
            MenuAction::ResetLedger => write!(f, "♻️  Reset export marks"),
            MenuAction::ShowStatus => write!(f, "📊 Show ledger status"),
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let store = JsonFileStore::new(&config.storage.ledger_path);

        let mailer: Box<dyn MailSender> = match MailgunConfig::from_env() {
            Ok(mailgun) => Box::new(MailgunSender::new(mailgun)),
            Err(e) => {
                warn!("mail sender not configured: {e}");
                Box::new(DisabledSender)
            }
        };

        let source = load_history_source(&config.storage.submissions_path).await;
        if source.is_available().await {
            info!("loaded submission history from {}", config.storage.submissions_path);
        } else {
            warn!(
                "submission history not available at {} (backfill disabled)",
                config.storage.submissions_path
            );
        }

        Ok(Self {
            config,
            store: Box::new(store),
            mailer,
            source: Box::new(source),
            mapper: FieldMapper::new(),
        })
    }
}
