use clap::Subcommand;

use crate::context::AppContext;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Cycles completed today
    Today,
    /// All counters
    All,
    /// Zero every counter
    Reset,
}

pub fn run(ctx: &AppContext, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        StatsAction::Today => {
            let view = ctx.observer();
            let stats = view.stats();
            let today = serde_json::json!({
                "date": stats.last_reset_date,
                "todayCount": stats.today_count,
            });
            println!("{}", serde_json::to_string_pretty(&today)?);
        }
        StatsAction::All => {
            let view = ctx.observer();
            let stats = view.stats();
            let all = serde_json::json!({
                "todayCount": stats.today_count,
                "totalCount": stats.total_count,
                "lastResetDate": stats.last_reset_date,
                "totalBreakTime": stats.total_break_time,
                "totalBreakMinutes": stats.total_break_minutes(),
            });
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        StatsAction::Reset => {
            let _owner = ctx.claim()?;
            let mut controller = ctx.controller();
            let stats = controller.reset_stats();
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
    }
    Ok(())
}
