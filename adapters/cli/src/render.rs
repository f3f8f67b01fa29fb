//! Plain-text presentation of the tally.

use deck_tally_core::{CategoryId, ScoringRule, TallyState};
use deck_tally_system_scoring::{Clarity, ScoreEngine};

/// Renders the level header followed by one block per entity.
pub(crate) fn render_overview(state: &TallyState, engine: &ScoreEngine) -> String {
    let modifier = if state.modifier { "on" } else { "off" };
    let mut lines = vec![format!(
        "Level {} | modifier {} | ceiling {} pt",
        state.level.get(),
        modifier,
        engine.ceiling(state),
    )];

    for score in engine.scoreboard(state) {
        lines.push(String::new());
        lines.push(format!(
            "Entity {} [{}] {}/{} pt ({} remaining)",
            score.entity.ordinal(),
            clarity_label(score.clarity()),
            score.total,
            score.ceiling,
            score.remaining,
        ));

        for line in engine.breakdown(state.counts(score.entity)) {
            let category = line.category.category();
            let count = match category.cap() {
                Some(cap) => format!("{}/{cap}", line.count),
                None => line.count.to_string(),
            };
            lines.push(format!(
                "{:>3}. {:<24} {:>5} {:>5} pt",
                line.category.index() + 1,
                category.label(),
                count,
                line.points,
            ));
        }
    }

    lines.join("\n")
}

/// Renders the static category table.
pub(crate) fn render_categories() -> String {
    CategoryId::all()
        .map(|id| {
            let category = id.category();
            let cap = match category.cap() {
                Some(cap) => format!("cap {cap}"),
                None => "uncapped".to_owned(),
            };
            let points = match category.rule() {
                ScoringRule::PerUnit(points) => format!("{points} pt each"),
                ScoringRule::Schedule(schedule) => {
                    let steps: Vec<String> = schedule.iter().map(u32::to_string).collect();
                    format!("{} pt", steps.join(", "))
                }
            };
            format!(
                "{:>3}. {:<24} {:<9} {}",
                id.index() + 1,
                category.label(),
                cap,
                points
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clarity_label(clarity: Clarity) -> &'static str {
    match clarity {
        Clarity::Clear => "Clear",
        Clarity::Blurred => "Blurred",
    }
}
