use proptest::prelude::*;

use serviceworker_core::lifecycle::{UpdateWatcher, WatcherOutput};
use serviceworker_core::platform::{PlatformSignal, WorkerId};
use serviceworker_core::state_machine::{WorkerState, WorkerStateMachine};
use serviceworker_core::test_helpers::registration_handle;

fn state_strategy() -> impl Strategy<Value = WorkerState> {
    prop::sample::select(WorkerState::ORDER.to_vec())
}

fn worker_strategy() -> impl Strategy<Value = WorkerId> {
    prop::sample::select(vec!["sw-a", "sw-b", "sw-c"]).prop_map(|id| WorkerId::new(id))
}

/// Signals for a small fixed pool of workers, so duplicates and
/// out-of-order reports are common
fn signal_strategy() -> impl Strategy<Value = PlatformSignal> {
    prop_oneof![
        worker_strategy().prop_map(|worker| PlatformSignal::CandidateDiscovered { worker }),
        (worker_strategy(), state_strategy())
            .prop_map(|(worker, state)| PlatformSignal::StateChanged { worker, state }),
        prop::option::of(worker_strategy())
            .prop_map(|controller| PlatformSignal::ControllerChanged { controller }),
    ]
}

proptest! {
    /// Property: accepted states always form a non-repeating prefix of the
    /// protocol order, with Redundant allowed early
    #[test]
    fn accepted_states_form_valid_prefix(reports in prop::collection::vec(state_strategy(), 0..20)) {
        let (mut machine, _) = WorkerStateMachine::discover(WorkerId::new("sw-p"), false);

        for to in reports {
            let before = machine.current_state();
            match machine.transition(to) {
                Ok(event) => {
                    prop_assert_eq!(event.from_state, Some(before));
                    prop_assert!(before.can_transition_to(to));
                }
                Err(_) => prop_assert_eq!(machine.current_state(), before),
            }
        }

        let history = machine.history();
        for pair in history.windows(2) {
            prop_assert!(pair[0].ordinal() < pair[1].ordinal());
            prop_assert!(pair[1] == WorkerState::Redundant || pair[1].ordinal() == pair[0].ordinal() + 1);
        }
        prop_assert_eq!(history[0], WorkerState::Installing);
    }

    /// Property: the watcher never announces the same candidate twice, and
    /// never announces anything without a controller
    #[test]
    fn update_notices_are_unique_and_need_a_controller(
        initial_controller in any::<bool>(),
        signals in prop::collection::vec(signal_strategy(), 0..40),
    ) {
        let handle = registration_handle("/app/sw.js", "/app/");
        let controller = initial_controller.then(|| WorkerId::new("sw-old"));
        let mut watcher = UpdateWatcher::attach(&handle, controller);
        let mut announced = Vec::new();

        for signal in &signals {
            let had_controller = watcher.has_controller();
            for output in watcher.observe(signal) {
                if let WatcherOutput::Update(notice) = output {
                    prop_assert!(!announced.contains(&notice.candidate));
                    let discovered_as_update = watcher
                        .candidate(&notice.candidate)
                        .map(WorkerStateMachine::is_update)
                        .unwrap_or(had_controller);
                    prop_assert!(discovered_as_update);
                    announced.push(notice.candidate);
                }
            }
        }

        if !initial_controller
            && !signals.iter().any(|s| matches!(s, PlatformSignal::StateChanged { state: WorkerState::Activated, .. }))
            && !signals.iter().any(|s| matches!(s, PlatformSignal::ControllerChanged { controller: Some(_) }))
        {
            prop_assert!(announced.is_empty());
        }
    }
}
