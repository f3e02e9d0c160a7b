use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    constants::{DIV_COUNT, DIV_IN_USE},
    context::{DqFilter, EntryFilter, EventContext},
    db_structs::{DivisionStat, Entry, EventConfig, OverallStat},
    handicap::{handicap_time, replay_note, struggle_list, watch_list},
    promotion::PromotionReport,
    rating_tracker::FoldSummary,
    statistics::std_dev_per_minute,
    structures::{disqualification::ReplayFlag, subdivision::Subdivision},
    wrs_model::RunOutcome
};

/// Everything an external renderer needs from one run.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: DateTime<Utc>,
    pub event: &'a EventConfig,
    pub entries: &'a [Entry],
    pub overall: &'a OverallStat,
    pub divisions: &'a [DivisionStat],
    pub handicap_order: &'a [usize],
    pub fold: FoldSummary,
    pub promotions: &'a PromotionReport
}

impl<'a> RunSummary<'a> {
    pub fn new(ctx: &'a EventContext, outcome: &'a RunOutcome) -> RunSummary<'a> {
        RunSummary {
            generated_at: Utc::now(),
            event: &ctx.event,
            entries: &ctx.entries,
            overall: &ctx.overall,
            divisions: &ctx.divisions,
            handicap_order: &outcome.handicap_order,
            fold: outcome.fold,
            promotions: &outcome.promotions
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn status_text(event: &EventConfig) -> &'static str {
    if event.is_final() {
        "Official"
    } else {
        "Provisional"
    }
}

fn settings_line(event: &EventConfig) -> String {
    format!(
        "(Settings: Weight = {:.3} Squeeze = {:.3} Scoot = {:.3})",
        event.weight, event.squeeze, event.scoot
    )
}

fn rookie_mark(entry: &Entry) -> char {
    if entry.standing.rookie {
        'R'
    } else {
        '-'
    }
}

fn flag_text(entry: &Entry) -> &'static str {
    match entry.disqualification.flag() {
        Some(ReplayFlag::Green) => "[green]",
        Some(ReplayFlag::Red) => "[red]",
        Some(ReplayFlag::Black) => "[black]",
        None => ""
    }
}

/// The subdivision an entry's rating falls in within its provisional division.
fn banded_subdivision(entry: &Entry) -> Subdivision {
    Subdivision::from_index(((entry.rating - entry.provisional_division as f64) * 3.0) as i64)
}

fn standing_line(out: &mut String, entry: &Entry) {
    let _ = writeln!(
        out,
        " {} D{} {} >>> D{} {} (rating {:.3} hcp delta {:.3})",
        entry.display_name(),
        entry.division(),
        entry.standing.subdivision,
        entry.provisional_division,
        banded_subdivision(entry),
        entry.rating,
        entry.handicap_delta
    );
}

/// Event header, statistics, watch and struggle lists and the threshold table.
pub fn stats_report(ctx: &EventContext) -> String {
    let event = &ctx.event;
    let mut out = String::new();

    let _ = writeln!(out, "WRS Stats for Week {} ({}):", event.week, status_text(event));
    for (label, text) in [("", &event.description), ("Car: ", &event.car), ("Track: ", &event.track)] {
        if !text.is_empty() {
            let _ = writeln!(out, "{}{}", label, text);
        }
    }
    let _ = writeln!(out, "{}", settings_line(event));

    let overall = &ctx.overall;
    let _ = writeln!(out, "\nStatistics:\n");
    let _ = writeln!(
        out,
        "Overall Mean time: {} Dev/Min: {:.3} Deviation: {:.3}",
        overall.mean,
        std_dev_per_minute(overall.std_dev, overall.mean),
        overall.std_dev
    );
    let _ = writeln!(
        out,
        "Quality Mean time: {} Dev/Min: {:.3} Deviation: {:.3}",
        overall.quality_mean,
        std_dev_per_minute(overall.quality_std_dev, overall.quality_mean),
        overall.quality_std_dev
    );
    let _ = writeln!(out, "    average hcp delta: {:.3}", overall.handicap_delta);

    for stat in ctx.divisions.iter().skip(1).take(DIV_IN_USE as usize) {
        if stat.mean.is_zero() {
            continue;
        }
        let _ = writeln!(
            out,
            "D{}: Mean: {} Dev: {:.3} Dev/Min: {:.3} Par: {}",
            stat.division,
            stat.mean,
            stat.std_dev,
            std_dev_per_minute(stat.std_dev, stat.mean),
            stat.par
        );
        let _ = writeln!(
            out,
            "    q_mean = {} q_dev = {:.3}, q_dev/min = {:.3}",
            stat.quality_mean,
            stat.quality_std_dev,
            std_dev_per_minute(stat.quality_std_dev, stat.quality_mean)
        );
        let _ = writeln!(
            out,
            "    -({} {} {})+ average hcp delta: {:.3}",
            stat.performance.under, stat.performance.at, stat.performance.over, stat.handicap_delta
        );
    }

    if !event.is_qualifier() {
        let _ = writeln!(out, "\nWatch List:");
        for entry in watch_list(ctx) {
            standing_line(&mut out, entry);
        }
        let _ = writeln!(out, "\nStruggle List:");
        for entry in struggle_list(ctx) {
            standing_line(&mut out, entry);
        }
    }

    let _ = writeln!(out, "\nDivision thresholds:");
    for stat in ctx.divisions.iter().take(DIV_IN_USE as usize + 1) {
        let _ = writeln!(
            out,
            "D{} Par: ({}) G: ({}) S: ({}) B: ({}) range: ({:.3})",
            stat.division,
            stat.par,
            stat.gold,
            stat.silver,
            stat.bronze,
            (stat.bronze - stat.par).as_secs_f64()
        );
    }

    out
}

fn disqualified_line(out: &mut String, entry: &Entry) {
    let _ = writeln!(
        out,
        "DQ {} {} {}",
        entry.disqualification,
        entry.display_name(),
        flag_text(entry)
    );
}

fn qualifier_results(out: &mut String, ctx: &EventContext) {
    let _ = writeln!(out, "\nQualifier Results:\n");
    for entry in ctx.select(EntryFilter::eligible()) {
        let _ = writeln!(
            out,
            "{} / {} {} ({:.3}) D{}",
            entry.display_name(),
            entry.name,
            entry.time,
            entry.rating,
            entry.provisional_division
        );
    }
    for entry in ctx.select(EntryFilter { division: None, dq: DqFilter::Disqualified }) {
        disqualified_line(out, entry);
    }
}

/// Division, overall and handicap results for posting.
pub fn results_report(ctx: &EventContext, outcome: &RunOutcome) -> String {
    let event = &ctx.event;
    let mut out = String::new();

    let _ = writeln!(out, "Week {} ({}): {}", event.week, status_text(event), event.description);
    if !event.car.is_empty() || !event.track.is_empty() {
        let _ = writeln!(out, "{} @ {}", event.car, event.track);
    }
    if !event.comment.is_empty() {
        let _ = writeln!(out, "{}", event.comment);
    }

    if event.is_qualifier() {
        qualifier_results(&mut out, ctx);
        let _ = writeln!(out, "\n{}", settings_line(event));
        return out;
    }

    for division in 1..=DIV_COUNT {
        let eligible: Vec<&Entry> = ctx.select(EntryFilter::division(division)).collect();
        if eligible.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\nDivision {}:\n", division);
        for entry in eligible {
            let _ = writeln!(
                out,
                "{}--{}--{}-{}-{} {} {}",
                entry.place.unwrap_or_default(),
                entry.time,
                entry.points,
                rookie_mark(entry),
                entry.display_name(),
                replay_note(entry, event),
                flag_text(entry)
            );
        }
        let disqualified = EntryFilter {
            division: Some(division),
            dq: DqFilter::Disqualified
        };
        for entry in ctx.select(disqualified) {
            disqualified_line(&mut out, entry);
        }
    }

    let _ = writeln!(out, "\nOverall Results:");
    let mut division = 1;
    for entry in ctx.select(EntryFilter::eligible()) {
        while division <= DIV_COUNT && entry.time >= ctx.divisions[division as usize].par {
            let stat = &ctx.divisions[division as usize];
            let _ = writeln!(
                out,
                "\n>> Division {}: Par: {} Gold: {} Silver: {} Bronze: {}",
                division, stat.par, stat.gold, stat.silver, stat.bronze
            );
            division += 1;
        }
        let _ = writeln!(
            out,
            "{}--{}-{}-{} r={:.3} (d{}/{:.3})",
            entry.overall_place.unwrap_or_default(),
            entry.time,
            rookie_mark(entry),
            entry.display_name(),
            entry.rating,
            entry.provisional_division,
            entry.handicap_delta
        );
    }

    let _ = writeln!(out, "\nHandicapped Results:\n");
    for entry in outcome
        .handicap_order
        .iter()
        .filter_map(|i| ctx.entries.get(*i))
        .filter(|e| !e.standing.rookie)
    {
        let _ = writeln!(
            out,
            "{}--{}--({:+.3})-{}",
            entry.handicap_place.unwrap_or_default(),
            handicap_time(ctx, entry),
            entry.handicap_delta,
            entry.display_name()
        );
    }

    let _ = writeln!(out, "\n{}", settings_line(event));
    out
}

/// Promotions, the double promotion marker and rookie placements.
pub fn promotion_report(report: &PromotionReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "-------------- promotions -----------------");
    for promotion in &report.promotions {
        let stars = "*".repeat((promotion.delta - 2.0).max(0.0).ceil() as usize);
        let _ = writeln!(
            out,
            "{:.3} {} {} D{} {} -> D{} {} ({:.5} -{:.5})",
            promotion.rating,
            stars,
            promotion.name,
            promotion.from.0,
            promotion.from.1,
            promotion.to.0,
            promotion.to.1,
            promotion.rating,
            promotion.delta / 3.0
        );
    }
    if report.doubles().next().is_some() {
        let _ = writeln!(out, "9.999 * Denotes double promotion");
    }

    let _ = writeln!(out, "----------- rookie placement --------------");
    for placement in &report.placements {
        let _ = writeln!(
            out,
            "{:.3} {} -> D{} {} ({:.5})",
            placement.rating, placement.name, placement.division, placement.subdivision, placement.rating
        );
    }
    let _ = writeln!(out, "---------------------------------");

    out
}
