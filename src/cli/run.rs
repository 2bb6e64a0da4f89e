use dialoguer::{theme::ColorfulTheme, Select};
use tracing::error;

use crate::cli::cli::MenuAction;
use crate::models::{App, ExportOutcome, Result};

impl App {
    pub async fn run(&self) -> Result<()> {
        println!("\n📬 Contact Sync");
        println!("═══════════════════════════════════════");

        self.show_ledger_status().await?;

        loop {
            let actions = vec![
                MenuAction::RunDigest,
                MenuAction::GenerateSingle,
                MenuAction::SendSingle,
                MenuAction::GenerateSplit,
                MenuAction::SendSplit,
                MenuAction::ExportAll,
                MenuAction::Backfill,
                MenuAction::Cleanup,
                MenuAction::ResetLedger,
                MenuAction::ShowStatus,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::RunDigest => match self.run_digest().await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("digest failed: {e}"),
                },
                MenuAction::GenerateSingle => match self.generate_single(false).await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("generate failed: {e}"),
                },
                MenuAction::SendSingle => match self.generate_single(true).await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("send failed: {e}"),
                },
                MenuAction::GenerateSplit => match self.generate_split(false).await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("generate (split) failed: {e}"),
                },
                MenuAction::SendSplit => match self.generate_split(true).await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("send (split) failed: {e}"),
                },
                MenuAction::ExportAll => match self.export_all().await {
                    Ok(outcome) => print_outcome(outcome),
                    Err(e) => error!("full export failed: {e}"),
                },
                MenuAction::Backfill => match self.run_backfill().await {
                    Ok(stats) => println!(
                        "✅ Backfill done: +{}, no email: {}, duplicates: {}",
                        stats.added, stats.no_email, stats.duplicates
                    ),
                    Err(e) => error!("backfill failed: {e}"),
                },
                MenuAction::Cleanup => match self.run_cleanup().await {
                    Ok(stats) => println!(
                        "✅ Cleanup done: {} ledger records purged, {} CSV files deleted",
                        stats.ledger_purged, stats.files_deleted
                    ),
                    Err(e) => error!("cleanup failed: {e}"),
                },
                MenuAction::ResetLedger => match self.reset_ledger().await {
                    Ok(reset) => println!("✅ Export marks reset on {reset} records"),
                    Err(e) => error!("reset failed: {e}"),
                },
                MenuAction::ShowStatus => {
                    if let Err(e) = self.show_ledger_status().await {
                        error!("failed to show status: {e}");
                    }
                }
                MenuAction::Exit => {
                    println!("\n👋 Bye!");
                    break;
                }
            }
        }

        Ok(())
    }
}

fn print_outcome(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Done => println!("✅ Export complete"),
        ExportOutcome::Empty => println!("ℹ️  No contacts to export"),
        ExportOutcome::Failed => println!("❌ Could not create/send CSV, see the log"),
    }
}
