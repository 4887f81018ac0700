//! Property tests for monetary rounding and the authorization counter.

use chrono::Utc;
use common::{OrderId, ServiceId};
use domain::{Order, Service, reauthorization_limit, round_half_even};
use proptest::prelude::*;
use rust_decimal::Decimal;

proptest! {
    #[test]
    fn rounding_is_within_half_a_cent(mills in -10_000_000i64..10_000_000i64) {
        let value = Decimal::new(mills, 3);
        let rounded = round_half_even(value);

        prop_assert_eq!(rounded.scale(), 2);
        prop_assert!((rounded - value).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn ties_land_on_an_even_cent(cents in -1_000_000i64..1_000_000i64) {
        // cents + half a cent is always an exact tie
        let value = Decimal::new(cents * 10 + 5, 3);
        let rounded = round_half_even(value);

        let last_digit = (rounded.mantissa() % 10).abs();
        prop_assert_eq!(last_digit % 2, 0);
    }

    #[test]
    fn rounding_is_idempotent(mills in -10_000_000i64..10_000_000i64) {
        let once = round_half_even(Decimal::new(mills, 3));
        prop_assert_eq!(round_half_even(once), once);
    }

    #[test]
    fn limit_never_below_authorized(cents in 0i64..100_000_000i64) {
        let authorized = Decimal::new(cents, 2);
        prop_assert!(reauthorization_limit(authorized).is_some_and(|limit| limit >= authorized));
    }

    #[test]
    fn every_reauthorization_bumps_version_by_one(rounds in 1usize..8) {
        let mut order = Order::new(OrderId::new(), "Prop", "P-1", Utc::now());
        let service_id = ServiceId::new();
        order.add_service(Service::new(service_id, "Work", Decimal::new(100, 0))).unwrap();
        order.mark_diagnosed().unwrap();
        order.authorize(Decimal::new(100, 0)).unwrap();
        prop_assert_eq!(order.authorization_version().as_u32(), 1);

        let mut real = Decimal::new(100, 0);
        for round in 0..rounds {
            order.mark_in_progress().unwrap();
            real *= Decimal::new(2, 0);
            order.record_real_cost(service_id, real, None).unwrap();
            prop_assert!(order.attempt_complete().is_err());
            order.reauthorize(real).unwrap();
            prop_assert_eq!(order.authorization_version().as_u32() as usize, round + 2);
        }
    }
}
