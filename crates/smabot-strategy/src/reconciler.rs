//! Position reconciliation.
//!
//! Turns a signal and the positions currently open into an ordered list of
//! actions. Decides only; execution belongs to the broker.

use rust_decimal::Decimal;
use smabot_core::error::StrategyError;
use smabot_core::types::{Action, Position, Signal};

/// Decides which positions to close and whether to open a new one.
#[derive(Debug, Clone)]
pub struct PositionReconciler {
    volume: Decimal,
}

impl PositionReconciler {
    /// Create a reconciler opening positions of `volume` lots.
    pub fn new(volume: Decimal) -> Result<Self, StrategyError> {
        if volume <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(format!(
                "Order volume must be positive, got {volume}"
            )));
        }
        Ok(Self { volume })
    }

    /// Volume used for new positions.
    pub fn volume(&self) -> Decimal {
        self.volume
    }

    /// Reconcile `open_positions` against `signal`.
    ///
    /// * Buy: close every short, then open a long if nothing survives.
    /// * Sell: close every long, then open a short if nothing survives.
    /// * Flat: do nothing.
    ///
    /// `has_open_elsewhere` reports positions outside `open_positions` (for
    /// example on other symbols) that should also block a new entry.
    /// Closures always precede the opening. The same inputs always give the
    /// same actions.
    pub fn reconcile(
        &self,
        signal: &Signal,
        open_positions: &[Position],
        has_open_elsewhere: bool,
    ) -> Vec<Action> {
        let Some(target) = signal.direction.target_side() else {
            return Vec::new();
        };

        let mut actions: Vec<Action> = open_positions
            .iter()
            .filter(|p| p.side != target)
            .map(|p| Action::ClosePosition { ticket: p.ticket })
            .collect();

        // No pyramiding: a surviving position of the target side blocks entry
        let remaining = open_positions.len() - actions.len();
        if remaining == 0 && !has_open_elsewhere {
            actions.push(Action::OpenPosition {
                side: target,
                volume: self.volume,
            });
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use smabot_core::types::{Direction, PositionSide, Ticket};

    fn signal(direction: Direction) -> Signal {
        Signal {
            direction,
            last_close: dec!(1.20),
            moving_average: dec!(1.092),
            window: 10,
            bar_time: Utc::now(),
        }
    }

    fn position(ticket: u64, side: PositionSide) -> Position {
        Position::new(Ticket(ticket), "EURUSD", side, dec!(1.0), dec!(1.1))
    }

    fn reconciler() -> PositionReconciler {
        PositionReconciler::new(dec!(1.0)).unwrap()
    }

    #[test]
    fn test_buy_with_no_positions_opens_long() {
        let actions = reconciler().reconcile(&signal(Direction::Buy), &[], false);
        assert_eq!(
            actions,
            vec![Action::OpenPosition {
                side: PositionSide::Long,
                volume: dec!(1.0)
            }]
        );
    }

    #[test]
    fn test_buy_closes_short_then_opens_long() {
        let positions = vec![position(7, PositionSide::Short)];
        let actions = reconciler().reconcile(&signal(Direction::Buy), &positions, false);

        assert_eq!(
            actions,
            vec![
                Action::ClosePosition { ticket: Ticket(7) },
                Action::OpenPosition {
                    side: PositionSide::Long,
                    volume: dec!(1.0)
                },
            ]
        );
    }

    #[test]
    fn test_buy_with_existing_long_does_nothing() {
        let positions = vec![position(8, PositionSide::Long)];
        let actions = reconciler().reconcile(&signal(Direction::Buy), &positions, false);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_buy_with_mixed_sides_closes_only_shorts() {
        let positions = vec![
            position(1, PositionSide::Short),
            position(2, PositionSide::Long),
            position(3, PositionSide::Short),
        ];
        let actions = reconciler().reconcile(&signal(Direction::Buy), &positions, false);

        // The long survives, so no new entry
        assert_eq!(
            actions,
            vec![
                Action::ClosePosition { ticket: Ticket(1) },
                Action::ClosePosition { ticket: Ticket(3) },
            ]
        );
    }

    #[test]
    fn test_sell_closes_longs_then_opens_short() {
        let positions = vec![position(4, PositionSide::Long), position(5, PositionSide::Long)];
        let actions = reconciler().reconcile(&signal(Direction::Sell), &positions, false);

        assert_eq!(actions.len(), 3);
        assert!(actions[..2].iter().all(Action::is_close));
        assert_eq!(
            actions[2],
            Action::OpenPosition {
                side: PositionSide::Short,
                volume: dec!(1.0)
            }
        );
    }

    #[test]
    fn test_flat_emits_nothing() {
        let positions = vec![position(1, PositionSide::Short), position(2, PositionSide::Long)];
        assert!(reconciler()
            .reconcile(&signal(Direction::Flat), &positions, false)
            .is_empty());
        assert!(reconciler().reconcile(&signal(Direction::Flat), &[], true).is_empty());
    }

    #[test]
    fn test_positions_elsewhere_block_entry_but_not_closures() {
        let positions = vec![position(9, PositionSide::Short)];
        let actions = reconciler().reconcile(&signal(Direction::Buy), &positions, true);
        assert_eq!(actions, vec![Action::ClosePosition { ticket: Ticket(9) }]);
    }

    #[test]
    fn test_non_positive_volume_rejected() {
        assert!(PositionReconciler::new(Decimal::ZERO).is_err());
        assert!(PositionReconciler::new(dec!(-1)).is_err());
    }
}
