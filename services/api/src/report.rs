//! Plain-text renderings of scoring results for the command line.

use fleet_score::scoring::{
    BenchmarkSnapshot, Dimension, FleetRanking, MetricSnapshot, PoolStanding, RankingLookup,
    RatingSnapshot,
};
use std::fmt::Write;

fn dimension(value: Dimension) -> String {
    match value {
        Dimension::Available(score) => score.to_string(),
        Dimension::Unavailable => "unavailable".to_string(),
    }
}

pub(crate) fn render_metrics(snapshot: &MetricSnapshot) -> String {
    let mut out = String::new();
    let scores = &snapshot.scores;
    let _ = writeln!(
        out,
        "Performance for {} as of {}: {}",
        snapshot.operative_id, snapshot.as_of, snapshot.performance
    );
    let _ = writeln!(out, "- punctuality   {:>3}", scores.punctuality);
    let _ = writeln!(out, "- reliability   {:>3}", scores.reliability);
    let _ = writeln!(out, "- checklist     {:>3}", scores.checklist);
    let _ = writeln!(out, "- documentation {:>3}", scores.documentation);
    let _ = writeln!(out, "- volume        {:>3}", scores.volume);
    let _ = writeln!(
        out,
        "Execution records matched by name: {}",
        snapshot.execution_match.label()
    );

    let degraded = snapshot.sources.degraded();
    if !degraded.is_empty() {
        let _ = writeln!(out, "Unavailable sources: {}", degraded.join(", "));
    }
    out
}

pub(crate) fn render_rating(snapshot: &RatingSnapshot) -> String {
    let mut out = String::new();
    let dims = &snapshot.dimensions;
    let _ = writeln!(
        out,
        "Rating for {} as of {}: {} ({:.1} stars, {})",
        snapshot.operative_id,
        snapshot.as_of,
        snapshot.general_score,
        snapshot.stars,
        snapshot.label.label()
    );
    let _ = writeln!(out, "- performance         {}", dimension(dims.performance));
    let _ = writeln!(out, "- availability        {}", dimension(dims.availability));
    let _ = writeln!(out, "- revenue             {}", dimension(dims.revenue));
    let _ = writeln!(out, "- versatility         {}", dimension(dims.versatility));
    let _ = writeln!(
        out,
        "- client satisfaction {}",
        dimension(dims.client_satisfaction)
    );
    let _ = writeln!(
        out,
        "Revenue (90 days): {:.2} | services local/out of town: {}/{}",
        snapshot.revenue_90d, snapshot.local_services, snapshot.out_of_town_services
    );
    if snapshot.fleet_source.is_failed() {
        let _ = writeln!(out, "Fleet revenue unavailable; revenue scored at its default");
    }
    match snapshot.last_service_on {
        Some(date) => {
            let _ = writeln!(out, "Last completed service: {date}");
        }
        None => {
            let _ = writeln!(out, "Last completed service: none");
        }
    }
    out
}

pub(crate) fn render_ranking(ranking: &FleetRanking, lookup: Option<&RankingLookup>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Fleet ranking {} to {} ({})",
        ranking.window.start,
        ranking.window.end,
        ranking.basis.label()
    );

    if ranking.is_empty() {
        let _ = writeln!(out, "No completed or scheduled work in the window.");
        return out;
    }

    for entry in &ranking.entries {
        let _ = writeln!(
            out,
            "{:>3}. {:<28} score {:>6.2} | top {:>3}% | {:<8} | {} done | {:.2}",
            entry.position,
            entry.name,
            entry.fleet_score,
            entry.percentile.0,
            entry.tier.label(),
            entry.completed,
            entry.revenue
        );
    }

    match lookup {
        Some(RankingLookup::Ranked { entry, confidence }) => {
            let _ = writeln!(
                out,
                "Lookup: {} is #{} of {} ({} match)",
                entry.name,
                entry.position,
                entry.fleet_size,
                confidence.label()
            );
        }
        Some(RankingLookup::Ambiguous { candidates }) => {
            let _ = writeln!(out, "Lookup is ambiguous: {}", candidates.join(", "));
        }
        Some(RankingLookup::NotRanked) => {
            let _ = writeln!(out, "Lookup: not ranked in this window");
        }
        Some(RankingLookup::NoFleet) | None => {}
    }
    out
}

pub(crate) fn render_benchmarks(snapshot: &BenchmarkSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Pool benchmarks {} to {}: {} qualifying peers",
        snapshot.window.start, snapshot.window.end, snapshot.population
    );

    if let Some(averages) = &snapshot.averages {
        let _ = writeln!(
            out,
            "Pool averages: revenue {:.2} | per km {:.2} | per service {:.2} | services {:.2}",
            averages.revenue,
            averages.revenue_per_km,
            averages.revenue_per_service,
            averages.services
        );
    }
    if let Some(top) = &snapshot.top_performer {
        let _ = writeln!(out, "Top performer: {} ({:.2})", top.name, top.revenue);
    }

    match &snapshot.standing {
        PoolStanding::Ranked {
            stats,
            revenue_rank,
            services_rank,
            revenue_per_km_rank,
            percentile,
            ..
        } => {
            let _ = writeln!(
                out,
                "{}: revenue #{} | services #{} | per km #{} | percentile {}",
                stats.name, revenue_rank, services_rank, revenue_per_km_rank, percentile.0
            );
        }
        PoolStanding::NotInPool => {
            let _ = writeln!(out, "Operative does not qualify for the pool.");
        }
        PoolStanding::Ambiguous { candidates } => {
            let _ = writeln!(out, "Name is ambiguous: {}", candidates.join(", "));
        }
        PoolStanding::EmptyPool => {
            let _ = writeln!(out, "No peer qualifies; nothing to compare against.");
        }
    }
    out
}
