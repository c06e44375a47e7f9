// src/services/aggregator.rs
//
// Reduz as visitas da janela de 30 dias aos números e gráficos do dashboard.
// Função pura: nada de banco, nada de relógio (o "hoje" vem de fora).

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::models::dashboard::{DashboardStats, PeriodBucket, RankingEntry, VisitRecord};

/// Chaves do bloco de detalhes que já marcaram "oportunidade" em alguma versão do formulário.
pub const OPPORTUNITY_KEYS: &[&str] = &[
    "opportunity",
    "biz_opportunity",
    "posto_oportunidade",
    "trr_oportunidade",
];

pub const UNKNOWN_SALESPERSON: &str = "Desconhecido";
pub const UNKNOWN_REGION: &str = "Não informada";

const RANKING_SIZE: usize = 3;
const HISTOGRAM_DAYS: i64 = 7;

pub fn aggregate(visits: &[VisitRecord], today: NaiveDate) -> DashboardStats {
    let total_visits = visits.len();

    let unique_clients = visits
        .iter()
        .map(|v| v.client.as_str())
        .collect::<HashSet<_>>()
        .len();

    let opportunities = visits.iter().filter(|v| has_opportunity(&v.details)).count();

    // Percentual de exibição: vendedores em escala 200, regiões em 100, ambos limitados a 100
    let top_salespeople = rank(
        visits.iter().map(|v| label_or(v.salesperson.as_deref(), UNKNOWN_SALESPERSON)),
        total_visits,
        200.0,
    );
    let top_regions = rank(
        visits.iter().map(|v| label_or(v.region.as_deref(), UNKNOWN_REGION)),
        total_visits,
        100.0,
    );

    DashboardStats {
        total_visits,
        unique_clients,
        opportunities,
        visits_by_period: last_seven_days(visits, today),
        top_salespeople,
        top_regions,
    }
}

pub fn has_opportunity(details: &Value) -> bool {
    OPPORTUNITY_KEYS
        .iter()
        .filter_map(|key| details.get(*key))
        .any(is_affirmative)
}

fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("sim") || s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

fn label_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

// Conta por nome preservando a ordem de primeira aparição, assim o sort
// estável desempata pela ordem de entrada.
fn rank(names: impl Iterator<Item = String>, total: usize, scale: f64) -> Vec<RankingEntry> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for name in names {
        match index.get(&name) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(name.clone(), order.len());
                order.push((name, 1));
            }
        }
    }

    order.sort_by(|a, b| b.1.cmp(&a.1));

    let denominator = total.max(1) as f64;
    order
        .into_iter()
        .take(RANKING_SIZE)
        .map(|(name, visits)| RankingEntry {
            name,
            visits,
            percent: (visits as f64 / denominator * scale).min(100.0),
        })
        .collect()
}

fn last_seven_days(visits: &[VisitRecord], today: NaiveDate) -> Vec<PeriodBucket> {
    let days: Vec<NaiveDate> = (0..HISTOGRAM_DAYS)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect();
    let mut counts = vec![0usize; days.len()];

    for visit in visits {
        // Datas ilegíveis ficam fora do gráfico, mas já contaram no total
        let Some(date) = parse_day(&visit.date) else {
            continue;
        };
        if let Some(pos) = days.iter().position(|d| *d == date) {
            counts[pos] += 1;
        }
    }

    let max_count = counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    days.iter()
        .zip(counts)
        .map(|(day, count)| PeriodBucket {
            date: day.format("%Y-%m-%d").to_string(),
            label: day.format("%d/%m").to_string(),
            value: count as f64 / max_count * 100.0,
            count,
            is_today: *day == today,
        })
        .collect()
}

// Aceita "2025-03-10" e também timestamps ("2025-03-10T14:00:00Z")
fn parse_day(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn record(date: &str, salesperson: &str, client: &str, region: &str) -> VisitRecord {
        VisitRecord {
            date: date.to_string(),
            salesperson: Some(salesperson.to_string()),
            client: client.to_string(),
            region: Some(region.to_string()),
            details: json!({}),
        }
    }

    #[test]
    fn empty_input_yields_zeros() {
        let stats = aggregate(&[], today());

        assert_eq!(stats.total_visits, 0);
        assert_eq!(stats.unique_clients, 0);
        assert_eq!(stats.opportunities, 0);
        assert!(stats.top_salespeople.is_empty());
        assert!(stats.top_regions.is_empty());
        assert_eq!(stats.visits_by_period.len(), 7);
        assert!(stats.visits_by_period.iter().all(|b| b.value == 0.0 && b.count == 0));
    }

    #[test]
    fn seven_vs_three_visits_ranks_both_salespeople() {
        let mut visits = Vec::new();
        for i in 0..7 {
            visits.push(record("2025-03-14", "A", &format!("cliente {i}"), "BH-MG"));
        }
        for i in 0..3 {
            visits.push(record("2025-03-13", "B", &format!("outro {i}"), "BH-MG"));
        }

        let stats = aggregate(&visits, today());
        let ranking: Vec<(&str, usize)> = stats
            .top_salespeople
            .iter()
            .map(|e| (e.name.as_str(), e.visits))
            .collect();

        assert_eq!(ranking, vec![("A", 7), ("B", 3)]);
        assert_eq!(stats.total_visits, 10);
        // 7/10 * 200 passa de 100 e é limitado
        assert_eq!(stats.top_salespeople[0].percent, 100.0);
        assert!((stats.top_salespeople[1].percent - 60.0).abs() < 1e-9);
    }

    #[test]
    fn rankings_keep_top_three_sorted_descending() {
        let mut visits = Vec::new();
        for (name, n) in [("A", 1), ("B", 4), ("C", 2), ("D", 3)] {
            for _ in 0..n {
                visits.push(record("2025-03-15", name, "x", name));
            }
        }

        let stats = aggregate(&visits, today());

        for ranking in [&stats.top_salespeople, &stats.top_regions] {
            assert_eq!(ranking.len(), 3);
            assert!(ranking.windows(2).all(|w| w[0].visits >= w[1].visits));
            assert_eq!(ranking[0].name, "B");
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let visits = vec![
            record("2025-03-15", "Zé", "x", "R1"),
            record("2025-03-15", "Ana", "y", "R2"),
            record("2025-03-15", "Bia", "z", "R3"),
            record("2025-03-15", "Ana", "w", "R2"),
            record("2025-03-15", "Zé", "v", "R1"),
        ];

        let stats = aggregate(&visits, today());
        let names: Vec<&str> = stats.top_salespeople.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["Zé", "Ana", "Bia"]);
    }

    #[test]
    fn missing_names_fall_back_to_placeholders() {
        let visit = VisitRecord {
            date: "2025-03-15".into(),
            salesperson: None,
            client: "x".into(),
            region: Some("  ".into()),
            details: json!({}),
        };

        let stats = aggregate(&[visit], today());

        assert_eq!(stats.top_salespeople[0].name, UNKNOWN_SALESPERSON);
        assert_eq!(stats.top_regions[0].name, UNKNOWN_REGION);
        assert_eq!(stats.top_regions[0].percent, 100.0);
    }

    #[test]
    fn distinct_clients_never_exceed_total() {
        let visits = vec![
            record("2025-03-15", "A", "Posto Central", "R"),
            record("2025-03-14", "A", "Posto Central", "R"),
            record("2025-03-13", "B", "Frota Sul", "R"),
        ];

        let stats = aggregate(&visits, today());

        assert_eq!(stats.unique_clients, 2);
        assert!(stats.unique_clients <= stats.total_visits);
    }

    #[test]
    fn opportunity_flags_are_read_from_every_legacy_key() {
        let flagged = [
            json!({ "opportunity": "Sim" }),
            json!({ "biz_opportunity": "sim" }),
            json!({ "posto_oportunidade": "SIM" }),
            json!({ "trr_oportunidade": true }),
        ];
        for details in &flagged {
            assert!(has_opportunity(details), "{details} deveria contar");
        }

        assert!(!has_opportunity(&json!({ "opportunity": "Não" })));
        assert!(!has_opportunity(&json!({ "opportunity": 1 })));
        assert!(!has_opportunity(&json!({})));
        assert!(!has_opportunity(&Value::Null));
    }

    #[test]
    fn opportunity_count_grows_with_flagged_records() {
        let mut visits = vec![record("2025-03-15", "A", "x", "R")];
        let mut last = aggregate(&visits, today()).opportunities;

        for i in 0..4 {
            let mut v = record("2025-03-15", "A", &format!("c{i}"), "R");
            if i % 2 == 0 {
                v.details = json!({ "opportunity": "Sim" });
            }
            visits.push(v);
            let current = aggregate(&visits, today()).opportunities;
            assert!(current >= last);
            last = current;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn histogram_scales_against_the_busiest_day() {
        let visits = vec![
            record("2025-03-15", "A", "a", "R"),
            record("2025-03-15", "A", "b", "R"),
            record("2025-03-15", "A", "c", "R"),
            record("2025-03-15", "A", "d", "R"),
            record("2025-03-12", "A", "e", "R"),
            record("2025-03-09", "A", "f", "R"),
            record("2025-03-08", "A", "g", "R"), // fora da semana
        ];

        let period = aggregate(&visits, today()).visits_by_period;

        assert_eq!(period.len(), 7);
        assert_eq!(period[0].date, "2025-03-09");
        assert_eq!(period[0].label, "09/03");
        assert_eq!(period[0].value, 25.0);
        assert_eq!(period[3].count, 1);
        assert_eq!(period[6].value, 100.0);
        assert!(period[6].is_today);
        assert_eq!(period.iter().filter(|b| b.is_today).count(), 1);
        assert!(period.iter().all(|b| (0.0..=100.0).contains(&b.value)));
    }

    #[test]
    fn unparseable_dates_skip_the_histogram_but_count_in_total() {
        let visits = vec![
            record("ontem", "A", "a", "R"),
            record("", "A", "b", "R"),
            record("2025-13-45", "A", "c", "R"),
            record("2025-03-15T10:30:00Z", "A", "d", "R"),
        ];

        let stats = aggregate(&visits, today());

        assert_eq!(stats.total_visits, 4);
        let charted: usize = stats.visits_by_period.iter().map(|b| b.count).sum();
        assert_eq!(charted, 1);
    }

    #[test]
    fn histogram_crosses_month_boundaries() {
        let first = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let visits = vec![record("2025-02-24", "A", "a", "R")];

        let period = aggregate(&visits, first).visits_by_period;

        assert_eq!(period[0].date, "2025-02-24");
        assert_eq!(period[0].count, 1);
        assert_eq!(period[6].date, "2025-03-02");
    }
}
