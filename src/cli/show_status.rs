use crate::ledger::MAX_LEDGER_SIZE;
use crate::models::{App, Result};

impl App {
    pub async fn show_ledger_status(&self) -> Result<()> {
        let records = self.store.load().await?;
        let total = records.len();
        let exported = records.iter().filter(|r| r.exported).count();
        let pending = total - exported;

        println!("\n📊 Ledger status");
        println!("━━━━━━━━━━━━━━━━━━━━━");
        println!("   Total records:    {total} / {MAX_LEDGER_SIZE}");
        println!("   Already exported: {exported}");
        println!("   Pending export:   {pending}");

        if total > MAX_LEDGER_SIZE * 8 / 10 {
            println!("⚠️  Ledger is approaching its capacity limit");
        }
        Ok(())
    }
}
