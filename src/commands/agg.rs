//! `agg [interval]`: run the aggregation loop until interrupted.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use super::{Command, State};
use crate::rss::{Aggregator, RssFetcher};
use crate::{GatorError, Result};

/// Parse a duration such as `30s`, `1m`, `1h30m` or `1.5h`.
///
/// Units are `ms`, `s`, `m` and `h`. The result must be positive.
pub fn parse_interval(raw: &str) -> Result<Duration> {
    let invalid = |reason: &str| GatorError::Validation(format!("invalid interval {raw:?}: {reason}"));

    let mut rest = raw.trim();
    if rest.is_empty() {
        return Err(invalid("empty"));
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid("missing unit"))?;
        if number_len == 0 {
            return Err(invalid("expected a number"));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| invalid("bad number"))?;

        let after = &rest[number_len..];
        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let seconds_per_unit = match &after[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            unit => return Err(invalid(&format!("unknown unit {unit:?}"))),
        };

        let part = Duration::try_from_secs_f64(value * seconds_per_unit)
            .map_err(|_| invalid("out of range"))?;
        total = total.checked_add(part).ok_or_else(|| invalid("out of range"))?;
        rest = &after[unit_len..];
    }

    if total.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(total)
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub fn handler_agg<'a>(state: &'a State, cmd: &'a Command) -> BoxFuture<'a, Result<()>> {
    async move {
        if cmd.args.len() > 1 {
            return Err(GatorError::Validation(
                "usage: gator agg [interval]".to_string(),
            ));
        }
        let raw = cmd
            .args
            .first()
            .map(String::as_str)
            .unwrap_or(&state.config.aggregator.default_interval);
        let period = parse_interval(raw)?;

        let fetcher = RssFetcher::new(&state.config.aggregator)?;
        let aggregator = Aggregator::new(state.db.clone(), fetcher);

        println!("Collecting feeds every {raw} (Ctrl-C to stop)");
        aggregator.run(period, wait_for_ctrl_c()).await?;
        println!("Stopped");
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registered_commands;
    use crate::commands::tests::setup_state;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_interval(" 10s ").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_interval_errors() {
        for raw in ["", "10", "s", "10x", "0s", "1..5m", "-1m", "1m-"] {
            assert!(
                matches!(parse_interval(raw), Err(GatorError::Validation(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_agg_rejects_bad_interval() {
        let state = setup_state(None).await;
        let err = registered_commands()
            .run(&state, &Command::new("agg", ["soon"]))
            .await
            .unwrap_err();
        assert!(matches!(err.root(), GatorError::Validation(_)));
    }
}
