//! Keyed sliding-window rate limiter: once a key's allowance is exhausted
//! within the window, further requests from it are dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dhcproto::v6::{DhcpOption, OptionCode};

use crate::bundle::{self, TransactionBundle};
use crate::config::RateLimitKey;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Handler;

pub struct RateLimitHandler {
    key: RateLimitKey,
    rate: u32,
    window: Duration,
    burst: u32,
    seen: Mutex<HashMap<Vec<u8>, VecDeque<Instant>>>,
}

impl RateLimitHandler {
    pub fn new(key: RateLimitKey, rate: u32, per_secs: u64, burst: u32) -> Self {
        Self {
            key,
            rate,
            window: Duration::from_secs(per_secs.max(1)),
            burst,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn extract_key(&self, bundle: &TransactionBundle) -> Option<Vec<u8>> {
        let chosen = match self.key {
            RateLimitKey::Duid => None,
            RateLimitKey::InterfaceId => {
                bundle
                    .get_relay_option(OptionCode::InterfaceId, true)
                    .and_then(|o| match o {
                        DhcpOption::InterfaceId(i) => Some(i.id),
                        _ => None,
                    })
            }
            RateLimitKey::RemoteId => {
                bundle
                    .get_relay_option(OptionCode::RemoteId, true)
                    .map(|o| match o {
                        DhcpOption::Unknown(u) => u.data().to_vec(),
                        other => format!("{other:?}").into_bytes(),
                    })
            }
            RateLimitKey::SubscriberId => {
                bundle
                    .get_relay_option(OptionCode::SubscriberId, true)
                    .map(|o| match o {
                        DhcpOption::Unknown(u) => u.data().to_vec(),
                        other => format!("{other:?}").into_bytes(),
                    })
            }
            // the relay nearest the client (closest hop) is the one that
            // actually knows the client's link-layer address.
            RateLimitKey::LinkLayerId => bundle.relays.last().map(|r| {
                let mut v = r.link_address.octets().to_vec();
                v.extend_from_slice(&r.peer_address.octets());
                v
            }),
        };
        // fall back to DUID if the chosen key selector has nothing to
        // extract (e.g. no relay supplied remote-id).
        chosen.or_else(|| Self::duid_key(bundle))
    }

    fn duid_key(bundle: &TransactionBundle) -> Option<Vec<u8>> {
        bundle::request_options(&bundle.request)
            .into_iter()
            .find_map(|o| match o {
                DhcpOption::ClientId(c) => Some(c.id.as_ref().to_vec()),
                _ => None,
            })
    }
}

impl Handler for RateLimitHandler {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn pre(&self, bundle: &mut TransactionBundle) -> PipelineResult<()> {
        let Some(key) = self.extract_key(bundle) else {
            return Ok(());
        };
        let now = Instant::now();
        let allowance = self.rate.saturating_add(self.burst).max(1) as usize;

        let mut seen = self
            .seen
            .lock()
            .map_err(|_| PipelineError::Handler(anyhow::anyhow!("rate limit table poisoned")))?;
        let hits = seen.entry(key).or_default();
        while let Some(front) = hits.front() {
            if now.duration_since(*front) > self.window {
                hits.pop_front();
            } else {
                break;
            }
        }
        if hits.len() >= allowance {
            return Err(PipelineError::RateLimited);
        }
        hits.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhcproto::v6::{ClientId, Duid, Message, RelayForw, Solicit};
    use std::net::Ipv6Addr;

    fn bundle_with_client(duid: &[u8]) -> TransactionBundle {
        let mut request = Solicit::new();
        request
            .opts_mut()
            .insert(ClientId {
                id: Duid::unknown(duid),
            });
        let relay = RelayForw {
            hop_count: 0,
            link_address: Ipv6Addr::UNSPECIFIED,
            peer_address: Ipv6Addr::UNSPECIFIED,
            opts: Default::default(),
        };
        TransactionBundle::new(
            Message::RelayForw(relay.clone()),
            vec![relay],
            Message::Solicit(request),
        )
    }

    #[test]
    fn trips_after_allowance_exhausted() {
        let handler = RateLimitHandler::new(RateLimitKey::Duid, 5, 60, 0);
        for _ in 0..5 {
            let mut b = bundle_with_client(b"\x01\x02\x03");
            assert!(handler.pre(&mut b).is_ok());
        }
        let mut b = bundle_with_client(b"\x01\x02\x03");
        assert!(matches!(handler.pre(&mut b), Err(PipelineError::RateLimited)));
    }

    #[test]
    fn distinct_keys_tracked_independently() {
        let handler = RateLimitHandler::new(RateLimitKey::Duid, 1, 60, 0);
        let mut a = bundle_with_client(b"\x01");
        let mut b = bundle_with_client(b"\x02");
        assert!(handler.pre(&mut a).is_ok());
        assert!(handler.pre(&mut b).is_ok());
    }
}
