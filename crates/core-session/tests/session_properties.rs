//! At most one live subscription and one pending timeout, whatever the event order.

mod common;

use common::{harness, ms, press, release};
use core_session::Phase;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Press(u16, u16),
    Release(u16, u16),
    Mutate,
    FireTimeout,
    Advance(u64),
    Reset,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u16..80, 0u16..24).prop_map(|(c, r)| Step::Press(c, r)),
        (0u16..80, 0u16..24).prop_map(|(c, r)| Step::Release(c, r)),
        Just(Step::Mutate),
        Just(Step::FireTimeout),
        (0u64..3000).prop_map(Step::Advance),
        Just(Step::Reset),
    ]
}

proptest! {
    #[test]
    fn single_subscription_and_timer(steps in prop::collection::vec(step(), 1..40)) {
        let mut h = harness();
        for s in steps {
            match s {
                Step::Press(c, r) => { h.controller.on_press(&press(c, r)); }
                Step::Release(c, r) => { h.controller.on_release(&release(c, r)); }
                Step::Mutate => {
                    for batch in h.table.mutate_text() {
                        h.controller.on_mutations(&batch);
                    }
                }
                Step::FireTimeout => {
                    if let Some((id, _)) = h.timers.last_scheduled() {
                        h.controller.on_timeout(id);
                    }
                }
                Step::Advance(n) => h.clock.advance(ms(n)),
                Step::Reset => h.controller.reset(),
            }
            prop_assert!(h.table.live() <= 1);
            prop_assert!(h.timers.pending() <= 1);
            let armed = h.controller.phase() == Phase::Armed;
            prop_assert_eq!(armed, h.controller.watcher_active());
            prop_assert_eq!(armed, h.controller.pending_timeout().is_some());
        }
    }
}
