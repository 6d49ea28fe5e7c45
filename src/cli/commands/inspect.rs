//! Inspect command - Summarize a learned Q-table

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        commands::TableArgs,
        output::{format_number, print_kv, print_section, print_subsection},
    },
    q_learning::{QTable, q_table::greedy},
    types::{Action, ActionValues},
};

#[derive(Parser, Debug)]
#[command(about = "Summarize a Q-table")]
pub struct InspectArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Number of highest-valued states to list
    #[arg(long, short = 'n', default_value_t = 10)]
    pub top: usize,

    /// Print the summary as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// A state with its greedy action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedState {
    pub state: String,
    pub best_action: Action,
    pub value: f64,
    pub values: ActionValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub states: usize,
    /// States where every value is still zero
    pub unvisited: usize,
    /// Greedy action counts in action order
    pub best_actions: [usize; 3],
    /// `(min, max)` receptacle bucket over positional states
    pub receptacle_range: Option<(i64, i64)>,
    /// `(min, max)` target bucket over positional states
    pub target_range: Option<(i64, i64)>,
    pub top: Vec<RankedState>,
}

impl TableSummary {
    pub fn from_table(table: &QTable, top: usize) -> Self {
        let mut best_actions = [0usize; 3];
        let mut unvisited = 0;
        let mut receptacle_range: Option<(i64, i64)> = None;
        let mut target_range: Option<(i64, i64)> = None;
        let mut ranked = Vec::with_capacity(table.len());

        for (state, values) in table.iter() {
            let (best_action, value) = greedy(values);
            best_actions[best_action.index()] += 1;
            if values.iter().all(|v| *v == 0.0) {
                unvisited += 1;
            }
            if let Some((receptacle, target)) = state.buckets() {
                receptacle_range = Some(widen(receptacle_range, receptacle));
                target_range = Some(widen(target_range, target));
            }
            ranked.push(RankedState {
                state: state.to_string(),
                best_action,
                value,
                values: *values,
            });
        }

        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        ranked.truncate(top);

        Self {
            states: table.len(),
            unvisited,
            best_actions,
            receptacle_range,
            target_range,
            top: ranked,
        }
    }
}

fn widen(range: Option<(i64, i64)>, value: i64) -> (i64, i64) {
    match range {
        Some((lo, hi)) => (lo.min(value), hi.max(value)),
        None => (value, value),
    }
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let table = args.table.load()?;
    let summary = TableSummary::from_table(&table, args.top);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_section(&format!("Q-table: {}", args.table.table.display()));
    print_kv("Format", args.table.format().as_str());
    print_kv("States", &format_number(summary.states));
    print_kv("Unvisited", &format_number(summary.unvisited));
    if let Some((lo, hi)) = summary.receptacle_range {
        print_kv("Receptacle buckets", &format!("{lo}..={hi}"));
    }
    if let Some((lo, hi)) = summary.target_range {
        print_kv("Target buckets", &format!("{lo}..={hi}"));
    }

    print_subsection("Greedy action distribution");
    for action in Action::ALL {
        print_kv(action.name(), &format_number(summary.best_actions[action.index()]));
    }

    if !summary.top.is_empty() {
        print_subsection(&format!("Top {} states by value", summary.top.len()));
        for ranked in &summary.top {
            println!(
                "  {:>10}  {:<10}  {:>9.3}   [{:.3}, {:.3}, {:.3}]",
                ranked.state,
                ranked.best_action.name(),
                ranked.value,
                ranked.values[0],
                ranked.values[1],
                ranked.values[2]
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StateKey;

    #[test]
    fn test_table_summary() {
        let mut table = QTable::new();
        table.set(&StateKey::from_buckets(0, 3), Action::MoveRight, 4.0);
        table.set(&StateKey::from_buckets(-2, 1), Action::Stay, 9.0);
        table.set(&StateKey::from_buckets(5, -7), Action::MoveLeft, -1.0);
        table.set(&StateKey::none(), Action::Stay, 0.0);

        let summary = TableSummary::from_table(&table, 2);

        assert_eq!(summary.states, 4);
        assert_eq!(summary.unvisited, 1);
        // (5,-7) has only a negative left value so greedy picks stay
        assert_eq!(summary.best_actions, [1, 2, 1]);
        assert_eq!(summary.receptacle_range, Some((-2, 5)));
        assert_eq!(summary.target_range, Some((-7, 3)));
        assert_eq!(summary.top.len(), 2);
        assert_eq!(summary.top[0].state, "-2,1");
        assert_eq!(summary.top[1].best_action, Action::MoveRight);
    }
}
