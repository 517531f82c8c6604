mod common;

#[cfg(test)]
mod tests {
    use super::common::{impolite_config, FakeMatcher, Input, Rig};
    use autocontinue::libs::clock::Clock;
    use autocontinue::libs::config::ActionConfig;
    use autocontinue::libs::control::{
        CycleOutcome, CLICK_SETTLE, CYCLE_DELAY, DRY_RUN_NUDGE, MAX_BACKOFF, PAUSED_SLEEP, REST_SLICE,
    };
    use autocontinue::libs::geometry::{Point, Region};
    use autocontinue::libs::matcher::MatchError;
    use autocontinue::libs::session::SessionEvent;
    use std::time::Duration;

    const ICON: Point = Point::new(640, 480);
    const TARGET: Point = Point::new(440, 430);

    #[test]
    fn acts_at_icon_plus_offset_then_cools_down() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let mut control = rig.control_loop(impolite_config());
        let origin = rig.actuator.pointer();

        let outcome = control.process_cycle().unwrap();

        assert_eq!(outcome, CycleOutcome::Acted { target: TARGET });
        assert_eq!(
            rig.actuator.inputs(),
            vec![
                Input::Click(TARGET),
                Input::Type(control.config().text.clone()),
                Input::Press("enter".to_string()),
                Input::MoveTo(origin),
            ]
        );
        assert!(rig.clock.sleeps().contains(&CLICK_SETTLE));
        assert_eq!(rig.state.last_action_time(), Some(rig.clock.now()));
        assert_eq!(control.last_known_match(), Some(ICON));

        rig.clock.advance(Duration::from_secs(5));
        let searches = rig.matcher.calls().len();
        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::CoolingDown);
        assert_eq!(rig.matcher.calls().len(), searches, "no search while cooling down");
        assert_eq!(rig.actuator.inputs().len(), 4);
    }

    #[test]
    fn acts_again_once_the_cooldown_has_passed() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let mut control = rig.control_loop(impolite_config());

        assert!(control.process_cycle().unwrap().acted());
        let first = rig.state.last_action_time().unwrap();

        rig.clock.advance(Duration::from_secs(14));
        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::CoolingDown);

        rig.clock.advance(Duration::from_secs(1));
        assert!(control.process_cycle().unwrap().acted());
        let second = rig.state.last_action_time().unwrap();
        assert!(second.duration_since(first) >= Duration::from_secs(15));
    }

    #[test]
    fn paused_cycle_does_nothing_but_sleep() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.state.request_pause();
        let mut control = rig.control_loop(ActionConfig::default());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::Paused);
        assert!(rig.matcher.calls().is_empty());
        assert_eq!(rig.actuator.position_reads(), 0, "no activity check while paused");
        assert!(rig.actuator.inputs().is_empty());
        assert_eq!(rig.clock.sleeps(), vec![PAUSED_SLEEP]);
        assert_eq!(rig.state.last_action_time(), None);
    }

    #[test]
    fn operator_activity_defers_the_action_but_keeps_the_match() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.actuator.queue_samples(&[Point::new(0, 0), Point::new(100, 100)]);
        let mut control = rig.control_loop(ActionConfig::default());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::UserActive);
        assert_eq!(control.last_known_match(), Some(ICON));
        assert!(!rig.actuator.clicked());
        assert!(!rig.actuator.typed());
        assert_eq!(rig.state.last_action_time(), None);
        assert!(rig.clock.sleeps().contains(&Duration::from_millis(500)));
    }

    #[test]
    fn idle_operator_lets_the_action_through() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let mut control = rig.control_loop(ActionConfig::default());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::Acted { target: TARGET });
    }

    #[test]
    fn region_miss_falls_back_to_full_screen() {
        let matcher = FakeMatcher::default();
        matcher.push(Ok(Some(ICON)));
        let rig = Rig::new(matcher);
        let mut control = rig.control_loop(ActionConfig {
            cooldown: Duration::ZERO,
            ..impolite_config()
        });
        assert!(control.process_cycle().unwrap().acted());

        let moved = Point::new(900, 300);
        rig.matcher.push(Ok(None));
        rig.matcher.push(Ok(Some(moved)));
        assert!(control.process_cycle().unwrap().acted());

        assert_eq!(
            rig.matcher.calls(),
            vec![None, Some(Region::new(540, 380, 200, 200)), None]
        );
        assert_eq!(control.last_known_match(), Some(moved));
    }

    #[test]
    fn region_hit_skips_the_full_screen_search() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let mut control = rig.control_loop(ActionConfig {
            cooldown: Duration::ZERO,
            ..impolite_config()
        });
        control.process_cycle().unwrap();
        control.process_cycle().unwrap();

        assert_eq!(rig.matcher.calls(), vec![None, Some(Region::centered_on(ICON, 200))]);
    }

    #[test]
    fn miss_everywhere_is_not_found() {
        let rig = Rig::new(FakeMatcher::default());
        let mut control = rig.control_loop(impolite_config());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::NotFound);
        assert_eq!(control.last_known_match(), None);
        assert!(rig.actuator.inputs().is_empty());
    }

    #[test]
    fn last_match_survives_misses() {
        let matcher = FakeMatcher::default();
        matcher.push(Ok(Some(ICON)));
        let rig = Rig::new(matcher);
        rig.actuator.queue_samples(&[Point::new(0, 0), Point::new(50, 50)]);
        let mut control = rig.control_loop(ActionConfig::default());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::UserActive);
        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::NotFound);
        assert_eq!(control.last_known_match(), Some(ICON));
    }

    #[test]
    fn dry_run_moves_the_pointer_only() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let origin = rig.actuator.pointer();
        let mut control = rig.control_loop(ActionConfig {
            dry_run: true,
            notify: true,
            ..impolite_config()
        });

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::DryRun { target: TARGET });
        assert_eq!(
            rig.actuator.inputs(),
            vec![
                Input::MoveTo(TARGET),
                Input::MoveBy(DRY_RUN_NUDGE, 0),
                Input::MoveBy(-DRY_RUN_NUDGE, 0),
                Input::MoveTo(origin),
            ]
        );
        assert!(!rig.actuator.clicked());
        assert!(!rig.actuator.typed());
        assert!(rig.state.last_action_time().is_some(), "dry run restarts the cooldown");
        assert!(rig.notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_injection_restores_pointer_and_keeps_cooldown_open() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.actuator.fail_typing();
        let origin = rig.actuator.pointer();
        let mut control = rig.control_loop(impolite_config());

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::ActionFailed);
        assert_eq!(rig.actuator.inputs().last(), Some(&Input::MoveTo(origin)));
        assert_eq!(rig.state.last_action_time(), None);

        // Not cooling down: the next cycle searches again.
        let searches = rig.matcher.calls().len();
        control.process_cycle().unwrap();
        assert!(rig.matcher.calls().len() > searches);
    }

    #[test]
    fn search_errors_escalate_the_backoff() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        for _ in 0..4 {
            rig.matcher.push(Err(MatchError::Capture("display asleep".to_string())));
        }
        let mut control = rig.control_loop(ActionConfig {
            cooldown: Duration::ZERO,
            ..impolite_config()
        });
        assert_eq!(control.cycle_delay(), CYCLE_DELAY);

        assert_eq!(control.process_cycle().unwrap(), CycleOutcome::SearchFailed);
        assert_eq!(control.cycle_delay(), Duration::from_secs(3));
        control.process_cycle().unwrap();
        assert_eq!(control.cycle_delay(), Duration::from_secs(4));
        control.process_cycle().unwrap();
        control.process_cycle().unwrap();
        assert_eq!(control.cycle_delay(), MAX_BACKOFF);

        assert!(control.process_cycle().unwrap().acted());
        assert_eq!(control.cycle_delay(), CYCLE_DELAY);
    }

    #[test]
    fn notifies_after_a_real_action() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        let mut control = rig.control_loop(ActionConfig {
            notify: true,
            ..impolite_config()
        });

        control.process_cycle().unwrap();

        let sent = rig.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "autocontinue");
    }

    #[test]
    fn single_shot_run_stops_after_the_first_action() {
        let rig = Rig::new(FakeMatcher::default());
        rig.matcher.push(Ok(None));
        rig.matcher.push(Ok(Some(ICON)));
        let (events, mut received) = tokio::sync::mpsc::unbounded_channel();
        let control = rig
            .control_loop(ActionConfig {
                single_shot: true,
                ..impolite_config()
            })
            .with_events(events);

        control.run();

        assert_eq!(
            received.try_recv().unwrap(),
            SessionEvent::ActionDispatched { target: TARGET, simulated: false }
        );
        assert!(received.try_recv().is_err());
        assert!(rig.state.is_running(), "the controller decides when to quit");
        assert_eq!(rig.matcher.calls().len(), 2);
    }

    #[test]
    fn run_returns_once_the_session_stops() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.state.request_quit();
        let control = rig.control_loop(impolite_config());

        control.run();

        assert!(rig.matcher.calls().is_empty());
    }

    #[test]
    fn lost_pointer_under_polite_mode_fails_the_cycle() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.actuator.fail_position();
        let mut control = rig.control_loop(ActionConfig::default());

        assert!(control.process_cycle().is_err());
        assert!(rig.actuator.inputs().is_empty());
        assert_eq!(control.last_known_match(), Some(ICON));
        assert!(rig.state.last_action_time().is_none());
    }

    #[test]
    fn failed_cycles_back_off_and_the_loop_keeps_going() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.actuator.fail_position();
        let slices_per_backoff = (MAX_BACKOFF.as_millis() / REST_SLICE.as_millis()) as usize;
        rig.clock.quit_after(rig.state.clone(), 2 * slices_per_backoff);
        let control = rig.control_loop(ActionConfig::default());

        control.run();

        assert_eq!(rig.clock.sleeps(), vec![REST_SLICE; 2 * slices_per_backoff]);
        assert_eq!(rig.matcher.calls().len(), 2, "a second cycle ran after the first failed");
        assert!(rig.actuator.inputs().is_empty());
        assert!(!rig.state.is_running());
    }

    #[test]
    fn paused_loop_polls_once_a_second_without_extra_rest() {
        let rig = Rig::new(FakeMatcher::always(ICON));
        rig.state.request_pause();
        rig.clock.quit_after(rig.state.clone(), 3);
        let control = rig.control_loop(impolite_config());

        assert_eq!(control.delay_after(CycleOutcome::Paused), Duration::ZERO);
        assert_eq!(control.delay_after(CycleOutcome::NotFound), CYCLE_DELAY);
        control.run();

        assert_eq!(rig.clock.sleeps(), vec![PAUSED_SLEEP; 3]);
        assert!(rig.matcher.calls().is_empty());
    }
}
