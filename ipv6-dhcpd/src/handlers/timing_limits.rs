//! Clamps T1/T2 and lease lifetimes on every IA in the response to
//! configured policy bounds, independent of which assignment handler
//! filled the IA in.
//!
//! Assignment handlers (`static_assign`, a leasequery-backed one, ...)
//! know the lease they're granting but not server-wide timer policy; this
//! handler is the single place that enforces the invariant every outgoing
//! IA must satisfy: `t1 <= t2 <= min(preferred_lifetime of its leases)`,
//! with "infinite" represented as `u32::MAX`. It runs last among handlers
//! that build IAs, so whatever ran before it has already decided which
//! IAs get a lease and which get a negative status.

use dhcproto::v6::{DhcpOption, IAAddr, IAPrefix, IANA, IAPD};

use crate::bundle::TransactionBundle;
use crate::error::PipelineResult;
use crate::pipeline::Handler;

#[derive(Debug, Clone, Copy)]
pub struct TimingLimitsHandler {
    preferred_lifetime: u32,
    valid_lifetime: u32,
    t1_percent: f64,
    t2_percent: f64,
}

impl TimingLimitsHandler {
    pub fn new(preferred_lifetime: u32, valid_lifetime: u32, t1_percent: f64, t2_percent: f64) -> Self {
        Self {
            preferred_lifetime,
            valid_lifetime,
            t1_percent,
            t2_percent,
        }
    }

    fn timers_for(&self, shortest_preferred: u32) -> (u32, u32) {
        if shortest_preferred == u32::MAX {
            return (u32::MAX, u32::MAX);
        }
        let t1 = ((shortest_preferred as f64) * self.t1_percent) as u32;
        let t2 = ((shortest_preferred as f64) * self.t2_percent) as u32;
        // enforce t1 <= t2 <= shortest_preferred even if percentages are
        // misconfigured the wrong way round.
        let t2 = t2.min(shortest_preferred).max(t1);
        (t1, t2)
    }
}

impl Handler for TimingLimitsHandler {
    fn name(&self) -> &str {
        "timing-limits"
    }

    fn handle(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        for opt in bundle.response_options_mut() {
            match opt {
                DhcpOption::IANA(IANA { t1, t2, opts, .. }) => {
                    let shortest = clamp_addrs(opts.iter_mut(), self.preferred_lifetime, self.valid_lifetime);
                    let (new_t1, new_t2) = self.timers_for(shortest);
                    *t1 = new_t1;
                    *t2 = new_t2;
                }
                DhcpOption::IAPD(IAPD { t1, t2, opts, .. }) => {
                    let shortest = clamp_prefixes(opts.iter_mut(), self.preferred_lifetime, self.valid_lifetime);
                    let (new_t1, new_t2) = self.timers_for(shortest);
                    *t1 = new_t1;
                    *t2 = new_t2;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Clamp a single lease's lifetime to a policy ceiling; an already-infinite
/// lifetime (`u32::MAX`) is replaced by the ceiling rather than left alone,
/// since "infinite" only makes sense if policy actually allows it.
fn clamp_lifetime(requested: u32, ceiling: u32) -> u32 {
    if requested == u32::MAX {
        ceiling
    } else {
        requested.min(ceiling)
    }
}

/// Clamp every `IAAddr` sub-option's lifetimes in place, returning the
/// shortest resulting preferred lifetime across all of them (or
/// `u32::MAX` if there are none, meaning "no constraint from leases").
fn clamp_addrs<'a>(
    opts: impl Iterator<Item = &'a mut dhcproto::v6::IANAOption>,
    preferred_ceiling: u32,
    valid_ceiling: u32,
) -> u32 {
    let mut shortest = u32::MAX;
    for opt in opts {
        if let dhcproto::v6::IANAOption::IAAddr(IAAddr {
            preferred_life,
            valid_life,
            ..
        }) = opt
        {
            *preferred_life = clamp_lifetime(*preferred_life, preferred_ceiling);
            *valid_life = clamp_lifetime(*valid_life, valid_ceiling).max(*preferred_life);
            shortest = shortest.min(*preferred_life);
        }
    }
    shortest
}

fn clamp_prefixes<'a>(
    opts: impl Iterator<Item = &'a mut dhcproto::v6::IAPDOption>,
    preferred_ceiling: u32,
    valid_ceiling: u32,
) -> u32 {
    let mut shortest = u32::MAX;
    for opt in opts {
        if let dhcproto::v6::IAPDOption::IAPrefix(IAPrefix {
            preferred_lifetime,
            valid_lifetime,
            ..
        }) = opt
        {
            *preferred_lifetime = clamp_lifetime(*preferred_lifetime, preferred_ceiling);
            *valid_lifetime = clamp_lifetime(*valid_lifetime, valid_ceiling).max(*preferred_lifetime);
            shortest = shortest.min(*preferred_lifetime);
        }
    }
    shortest
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::options::StatusCode;
    use dhcproto::v6::{IANAOptions, Status};

    fn iana_opts_with_addr(preferred: u32, valid: u32) -> IANAOptions {
        let mut opts = IANAOptions::new();
        opts.insert(IAAddr {
            addr: "2001:db8::1".parse().unwrap(),
            preferred_life: preferred,
            valid_life: valid,
            opts: Default::default(),
        });
        opts
    }

    #[test]
    fn clamps_to_ceiling_and_derives_t1_t2() {
        let handler = TimingLimitsHandler::new(3600, 7200, 0.5, 0.8);
        let mut opts = iana_opts_with_addr(10_000, 20_000);
        let shortest = clamp_addrs(opts.iter_mut(), 3600, 7200);
        assert_eq!(shortest, 3600);
        let (t1, t2) = handler.timers_for(shortest);
        assert_eq!(t1, 1800);
        assert_eq!(t2, 2880);
        assert!(t1 <= t2 && t2 <= shortest);
    }

    #[test]
    fn infinite_lease_yields_infinite_timers() {
        let handler = TimingLimitsHandler::new(u32::MAX, u32::MAX, 0.5, 0.8);
        let (t1, t2) = handler.timers_for(u32::MAX);
        assert_eq!(t1, u32::MAX);
        assert_eq!(t2, u32::MAX);
    }

    #[test]
    fn status_only_ia_has_no_lease_constraint() {
        let mut opts: IANAOptions = std::iter::once(DhcpOption::StatusCode(StatusCode {
            status: Status::NoAddrsAvail,
            msg: String::new(),
        }))
        .filter_map(|o| dhcproto::v6::IANAOption::try_from(&o).ok())
        .collect();
        let shortest = clamp_addrs(opts.iter_mut(), 3600, 7200);
        assert_eq!(shortest, u32::MAX);
    }
}
