//! Property test: the position invariant holds for any move sequence.

use blinds_common::motor::types::PositionState;
use proptest::prelude::*;

proptest! {
    #[test]
    fn invariant_holds_after_any_moves(
        start in prop_oneof![
            Just(PositionState::UNINITIALIZED),
            (0i16..=i16::MAX).prop_flat_map(|max| (Just(max), 0i16..=max))
                .prop_map(|(max, cur)| PositionState::new(max, cur)),
        ],
        moves in prop::collection::vec(any::<i32>(), 1..32),
    ) {
        let mut state = start;
        for steps in moves {
            let prev = state;
            state = state.after_move(steps);
            prop_assert!(state.is_initialized());
            prop_assert!(state.current_step <= state.max_steps);
            if prev.is_initialized() {
                prop_assert!(state.max_steps >= prev.max_steps);
            }
        }
    }

    #[test]
    fn small_moves_are_exact(
        max in 0i16..1000,
        frac in 0.0f64..=1.0,
        steps in -2000i32..2000,
    ) {
        let cur = (f64::from(max) * frac) as i16;
        let next = PositionState::new(max, cur).after_move(steps);
        let target = i32::from(cur) + steps;
        if target >= 0 {
            prop_assert_eq!(i32::from(next.current_step), target);
            prop_assert_eq!(i32::from(next.max_steps), target.max(i32::from(max)));
        } else {
            prop_assert_eq!(next.current_step, 0);
            prop_assert_eq!(i32::from(next.max_steps), i32::from(max) - target);
        }
    }
}
