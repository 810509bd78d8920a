//! Scenario catalog.
//!
//! Every scenario builds its own in-memory stores, remote and clock, drives the
//! core through the same entry points the browser shell uses, and checks the
//! observable outcome.

use anyhow::{Context, Result, ensure};
use colored::Colorize;
use giftflow_core::activity::kinds;
use giftflow_core::keys::{CONFIG_KEY, LOG_KEY, REMOTE_DOC_ID, STATE_KEY};
use giftflow_core::{
    ActivityLog, AppState, ContentConfig, FlowController, LOG_CAPACITY, ManualClock, MemoryRemote,
    MemoryStore, Navigation, PersistedStore, Step, SyncEngine, evaluate, hydrate, route_for,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

type Session = FlowController<MemoryStore, MemoryRemote, ManualClock>;

const EPOCH_MS: i64 = 1_700_000_000_000;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown scenario: {0}")]
    Unknown(String),
    #[error("no scenarios selected")]
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    check: fn() -> Result<()>,
}

const CATALOG: &[Scenario] = &[
    Scenario {
        name: "gating",
        description: "Routes ahead of progress redirect to the current step",
        check: gating,
    },
    Scenario {
        name: "monotonic",
        description: "Progress never moves backward outside a reset",
        check: monotonic,
    },
    Scenario {
        name: "reset",
        description: "Reset returns to the entry route and keeps the content",
        check: reset,
    },
    Scenario {
        name: "cross-tab",
        description: "A publish in one tab reaches another tab without the remote",
        check: cross_tab,
    },
    Scenario {
        name: "last-writer-wins",
        description: "Two sessions publishing in turn converge on the later document",
        check: last_writer_wins,
    },
    Scenario {
        name: "remote-outage",
        description: "Publishing while the remote is down keeps the local copy",
        check: remote_outage,
    },
    Scenario {
        name: "corrupt-cache",
        description: "Malformed persisted blobs load as defaults",
        check: corrupt_cache,
    },
    Scenario {
        name: "log-cap",
        description: "The activity log keeps only the newest entries",
        check: log_cap,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.name, s.description)).collect()
}

#[must_use]
pub fn find_scenario(name: &str) -> Option<Scenario> {
    CATALOG.iter().copied().find(|s| s.name == name)
}

/// Resolve a comma-separated selection. `all` expands to the whole catalog;
/// duplicates are dropped while keeping first-seen order.
///
/// # Errors
/// Fails on an unknown name or an empty selection.
pub fn select_scenarios(selection: &str) -> Result<Vec<Scenario>, SelectionError> {
    let mut selected: Vec<Scenario> = Vec::new();
    for name in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let batch = if name == "all" {
            CATALOG.to_vec()
        } else {
            vec![find_scenario(name).ok_or_else(|| SelectionError::Unknown(name.to_string()))?]
        };
        for scenario in batch {
            if !selected.iter().any(|s| s.name == scenario.name) {
                selected.push(scenario);
            }
        }
    }
    if selected.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(selected)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run(&self, scenario: &Scenario, iterations: usize) -> ScenarioResult {
        if self.verbose {
            println!("🧪 Running scenario: {}", scenario.name.bright_white());
        }

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut elapsed = Duration::ZERO;

        for i in 0..iterations {
            let start = Instant::now();
            let outcome = (scenario.check)();
            elapsed += start.elapsed();
            match outcome {
                Ok(()) => successes += 1,
                Err(err) => {
                    log::debug!("{} iteration {} failed: {err:#}", scenario.name, i + 1);
                    if self.verbose {
                        println!("  ❌ Iteration {}/{iterations} failed: {}", i + 1, format!("{err:#}").red());
                    }
                    failures.push(format!("Iteration {}: {err:#}", i + 1));
                }
            }
        }

        let average_duration = if iterations == 0 {
            Duration::ZERO
        } else {
            elapsed / u32::try_from(iterations).unwrap_or(u32::MAX)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

fn session(store: &MemoryStore, remote: &MemoryRemote) -> Session {
    FlowController::new(store.clone(), remote.clone(), ManualClock::starting_at(EPOCH_MS))
}

fn config_from(sender: &str) -> ContentConfig {
    let mut cfg = ContentConfig::default();
    cfg.couple.from = sender.to_string();
    cfg
}

fn logged(flow: &Session, kind: &str) -> bool {
    flow.activity().read_all().iter().any(|entry| entry.kind == kind)
}

fn gating() -> Result<()> {
    for current in Step::ALL {
        for requested in Step::ALL {
            let route = route_for(requested);
            let expected = (requested > current).then_some(route_for(current));
            ensure!(
                evaluate(route, current) == expected,
                "{route} at {current} gave {:?}",
                evaluate(route, current)
            );
        }
    }

    let store = MemoryStore::new();
    let remote = MemoryRemote::new();
    let flow = session(&store, &remote);
    flow.advance(Step::Puzzle);
    let entry = flow.open(route_for(Step::Summary), &store, |_| {});
    ensure!(
        entry == Navigation::Replace(route_for(Step::Puzzle)),
        "deep link landed on {entry:?}"
    );
    ensure!(logged(&flow, kinds::ROUTE_REDIRECTED), "redirect was not logged");
    ensure!(
        flow.on_route_change("/admin") == Navigation::Render,
        "admin route must never be gated"
    );
    Ok(())
}

fn monotonic() -> Result<()> {
    let store = MemoryStore::new();
    let remote = MemoryRemote::new();
    let flow = session(&store, &remote);

    ensure!(flow.advance(Step::Places), "advance to places did not move");
    ensure!(!flow.advance(Step::Puzzle), "advance moved backward");
    flow.set_state(AppState {
        step: Step::Landing,
        ..flow.state()
    });
    ensure!(flow.step() == Step::Places, "set_state rewound to {}", flow.step());

    let reopened = session(&store, &remote);
    ensure!(reopened.step() == Step::Places, "progress was not persisted");
    Ok(())
}

fn reset() -> Result<()> {
    let store = MemoryStore::new();
    let remote = MemoryRemote::new();
    let flow = session(&store, &remote);
    let _ = flow.open("/", &store, |_| {});
    let cfg = config_from("Operator");
    flow.publish_config(&cfg);

    flow.set_state(AppState {
        step: Step::Outfits,
        unlocked: true,
        chosen_place_id: Some("trattoria".to_string()),
        chosen_outfit_id: Some("classic".to_string()),
        ..AppState::default()
    });

    let nav = flow.reset_progress();
    ensure!(nav == Navigation::Replace("/"), "reset navigated to {nav:?}");
    let state = flow.state();
    ensure!(state.step == Step::Landing, "reset left step at {}", state.step);
    ensure!(state.chosen_place_id.is_none(), "place survived reset");
    ensure!(state.chosen_outfit_id.is_none(), "outfit survived reset");
    ensure!(flow.config() == cfg, "reset touched the content");
    ensure!(logged(&flow, kinds::PROGRESS_RESET), "reset was not logged");
    Ok(())
}

fn cross_tab() -> Result<()> {
    let tab_one = MemoryStore::new();
    let tab_two = tab_one.open_tab();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    let one = session(&tab_one, &remote);
    let two = session(&tab_two, &remote);
    let _ = one.open("/", &tab_one, |_| {});
    let _ = two.open("/", &tab_two, |_| {});

    one.publish_config(&config_from("Shared"));
    ensure!(tab_one.flush_signals() > 0, "publish raised no storage signal");
    ensure!(
        two.config().couple.from == "Shared",
        "second tab still shows {}",
        two.config().couple.from
    );

    one.advance(Step::Message);
    tab_one.flush_signals();
    ensure!(two.step() == Step::Message, "second tab did not pick up progress");
    ensure!(remote.pushes().is_empty(), "offline remote accepted a push");
    Ok(())
}

fn last_writer_wins() -> Result<()> {
    let remote = MemoryRemote::new();
    let first_store = MemoryStore::new();
    let second_store = MemoryStore::new();
    let first = session(&first_store, &remote);
    let second = session(&second_store, &remote);
    let _ = first.open("/", &first_store, |_| {});
    let _ = second.open("/", &second_store, |_| {});

    first.publish_config(&config_from("A"));
    second.publish_config(&config_from("B"));

    let document = remote
        .document(REMOTE_DOC_ID)
        .context("remote document missing after publish")?;
    let stored: ContentConfig = hydrate(&document);
    ensure!(stored.couple.from == "B", "remote holds {}", stored.couple.from);
    for (label, flow) in [("first", &first), ("second", &second)] {
        ensure!(
            flow.config().couple.from == "B",
            "{label} session shows {}",
            flow.config().couple.from
        );
    }
    Ok(())
}

fn remote_outage() -> Result<()> {
    let store = MemoryStore::new();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    let flow = session(&store, &remote);
    let _ = flow.open("/", &store, |_| {});

    let cfg = config_from("Offline");
    flow.publish_config(&cfg);
    ensure!(flow.config() == cfg, "publish was not applied locally");
    ensure!(flow.sync().load() == cfg, "publish was not cached");
    ensure!(logged(&flow, kinds::REMOTE_PUSH_FAILED), "push failure was not logged");

    remote.set_offline(false);
    flow.publish_config(&cfg);
    ensure!(remote.document(REMOTE_DOC_ID).is_some(), "push after recovery was lost");
    Ok(())
}

fn corrupt_cache() -> Result<()> {
    let store = MemoryStore::new();
    let remote = MemoryRemote::new();
    for blob in ["", "{", "null", "[1,2]", r#"{"step":"three"}"#, r#"{"places":{"a":1}}"#] {
        store.set(STATE_KEY, blob)?;
        store.set(CONFIG_KEY, blob)?;
        store.set(LOG_KEY, blob)?;
        let flow = session(&store, &remote);
        ensure!(Step::ALL.contains(&flow.step()), "blob {blob:?} produced no step");
        let cfg = flow.config();
        ensure!(!cfg.places.is_empty(), "blob {blob:?} left no places");
        ensure!(!cfg.outfits.is_empty(), "blob {blob:?} left no outfits");
    }
    let sync = SyncEngine::new(store, remote);
    ensure!(sync.load() == ContentConfig::default(), "garbage cache did not fall back");
    Ok(())
}

fn log_cap() -> Result<()> {
    let store = MemoryStore::new();
    let log = ActivityLog::new(store.clone(), ManualClock::starting_at(0));
    for i in 0..LOG_CAPACITY + 50 {
        log.record("tick", Some(json!(i)));
    }
    let entries = log.read_all();
    ensure!(entries.len() == LOG_CAPACITY, "log holds {} entries", entries.len());
    ensure!(entries[0].payload == Some(json!(50)), "oldest kept entry is {:?}", entries[0].payload);
    ensure!(
        entries[LOG_CAPACITY - 1].payload == Some(json!(LOG_CAPACITY + 49)),
        "newest entry is {:?}",
        entries[LOG_CAPACITY - 1].payload
    );
    log.clear();
    ensure!(log.is_empty(), "clear left entries behind");
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
