//! Whole-pipeline scenarios, each built by wiring a small `Plan`-shaped
//! pipeline by hand and driving it through `Pipeline::run` the way a
//! worker would, without any sockets or processes involved.

use std::io::Write as _;
use std::net::Ipv6Addr;

use dhcproto::v6::options::Status;
use dhcproto::v6::{
    ClientId, DhcpOption, Duid, IANA, InterfaceId, Message, OptionCode, RelayForw, ServerId,
    Solicit, UnknownOption,
};
use dhcproto::{Decodable, Decoder, Encodable, Encoder};

use ipv6_dhcpd::bundle::{self, TransactionBundle};
use ipv6_dhcpd::config::RateLimitKey;
use ipv6_dhcpd::config::RelayOptionKind;
use ipv6_dhcpd::handlers::option_copy::OptionCopyHandler;
use ipv6_dhcpd::handlers::rapid_commit::RapidCommitHandler;
use ipv6_dhcpd::handlers::rate_limit::RateLimitHandler;
use ipv6_dhcpd::handlers::static_assign::StaticAssignHandler;
use ipv6_dhcpd::handlers::unanswered::UnansweredIaHandler;
use ipv6_dhcpd::pipeline::{Node, Outcome, Pipeline};

const CLIENT_DUID: [u8; 10] = [0x00, 0x03, 0x00, 0x01, 0x00, 0x24, 0x36, 0xef, 0x1d, 0x89];

fn server_duid() -> Duid {
    Duid::unknown(&[0x00, 0x01, 0x00, 0x02, 0xaa, 0xbb])
}

fn solicit_with_ia(xid: [u8; 3], rapid_commit: bool) -> Solicit {
    let mut solicit = Solicit::new();
    solicit.xid.id = xid;
    solicit
        .opts_mut()
        .insert(ClientId { id: Duid::unknown(&CLIENT_DUID) });
    solicit.opts_mut().insert(IANA {
        id: 1,
        t1: 0,
        t2: 0,
        opts: Default::default(),
    });
    if rapid_commit {
        solicit
            .opts_mut()
            .insert(dhcproto::v6::options::RapidCommit);
    }
    solicit
}

fn relay_wrapping(request: Message, opts: Vec<DhcpOption>) -> TransactionBundle {
    let mut relay = RelayForw {
        hop_count: 0,
        link_address: Ipv6Addr::UNSPECIFIED,
        peer_address: Ipv6Addr::UNSPECIFIED,
        opts: Default::default(),
    };
    for opt in opts {
        if let Ok(o) = dhcproto::v6::RelayMessageOption::try_from(&opt) {
            relay.opts.insert(o);
        }
    }
    TransactionBundle::new(Message::RelayForw(relay.clone()), vec![relay], request)
}

fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    for row in rows {
        writeln!(f, "{row}").unwrap();
    }
    f
}

fn finalize(bundle: &TransactionBundle) -> Message {
    let client_id = bundle::request_options(&bundle.request)
        .into_iter()
        .find(|o| matches!(o, DhcpOption::ClientId(_)));
    let server_id = DhcpOption::ServerId(ServerId { id: server_duid() });
    bundle.finalize(client_id, server_id).expect("finalize")
}

/// Scenario 1: a Solicit with one IA-NA matches a CSV static assignment.
#[test]
fn solicit_with_matching_static_assignment() -> anyhow::Result<()> {
    let csv = write_csv(&["00:03:00:01:00:24:36:ef:1d:89,2001:db8::42"]);
    let mut pipeline = Pipeline::new(vec![
        Node::Handler(Box::new(StaticAssignHandler::new(csv.path().into()))),
        Node::Handler(Box::new(UnansweredIaHandler::new(false))),
        Node::Handler(Box::new(RapidCommitHandler::new(false))),
    ]);
    pipeline.worker_init()?;

    let request = Message::Solicit(solicit_with_ia([0x11, 0x22, 0x33], false));
    let mut bundle = relay_wrapping(request, vec![]);
    let outcome = pipeline.run(&mut bundle);
    assert!(matches!(outcome, Outcome::Respond));

    let response = finalize(&bundle);
    let Message::Advertise(adv) = response else {
        panic!("expected Advertise, got {response:?}");
    };
    assert_eq!(adv.xid.id, [0x11, 0x22, 0x33]);
    let opts: Vec<DhcpOption> = adv.opts().iter().map(DhcpOption::from).collect();
    assert!(opts.contains(&DhcpOption::ClientId(ClientId { id: Duid::unknown(&CLIENT_DUID) })));

    let iana = opts
        .iter()
        .find_map(|o| match o {
            DhcpOption::IANA(ia) => Some(ia),
            _ => None,
        })
        .expect("IA-NA in response");
    assert_eq!(iana.id, 1);
    assert_eq!(iana.t1, 1800);
    assert_eq!(iana.t2, 2880);
    let addr_opts: Vec<DhcpOption> = iana.opts.iter().map(DhcpOption::from).collect();
    let Some(DhcpOption::IAAddr(addr)) = addr_opts.into_iter().next() else {
        panic!("expected a single IA-ADDR, got {:?}", iana.opts);
    };
    assert_eq!(addr.addr, "2001:db8::42".parse::<Ipv6Addr>()?);
    assert_eq!(addr.preferred_life, 3600);
    assert_eq!(addr.valid_life, 7200);
    Ok(())
}

/// Scenario 2: the same client requests rapid commit and the server is
/// configured to allow it -- the Advertise is upgraded to a Reply.
#[test]
fn rapid_commit_upgrades_advertise_to_reply() -> anyhow::Result<()> {
    let csv = write_csv(&["00:03:00:01:00:24:36:ef:1d:89,2001:db8::42"]);
    let mut pipeline = Pipeline::new(vec![
        Node::Handler(Box::new(StaticAssignHandler::new(csv.path().into()))),
        Node::Handler(Box::new(UnansweredIaHandler::new(false))),
        Node::Handler(Box::new(RapidCommitHandler::new(true))),
    ]);
    pipeline.worker_init()?;

    let request = Message::Solicit(solicit_with_ia([0x44, 0x55, 0x66], true));
    let mut bundle = relay_wrapping(request, vec![]);
    let outcome = pipeline.run(&mut bundle);
    assert!(matches!(outcome, Outcome::Respond));

    let response = finalize(&bundle);
    let Message::Reply(reply) = response else {
        panic!("expected Reply, got {response:?}");
    };
    let opts: Vec<DhcpOption> = reply.opts().iter().map(DhcpOption::from).collect();
    assert!(opts.iter().any(|o| matches!(o, DhcpOption::RapidCommit(_))));
    Ok(())
}

/// Scenario 3: no CSV row matches, server is non-authoritative -- a Solicit
/// claims no existing binding, so the unanswered-IA fallback still answers
/// a definite `NoAddrsAvail` regardless of the authoritative flag.
#[test]
fn no_matching_assignment_non_authoritative_answers_no_addrs_avail() -> anyhow::Result<()> {
    let csv = write_csv(&["00:03:00:01:aa:bb:cc:dd:ee:ff,2001:db8::99"]);
    let mut pipeline = Pipeline::new(vec![
        Node::Handler(Box::new(StaticAssignHandler::new(csv.path().into()))),
        Node::Handler(Box::new(UnansweredIaHandler::new(false))),
        Node::Handler(Box::new(RapidCommitHandler::new(false))),
    ]);
    pipeline.worker_init()?;

    let request = Message::Solicit(solicit_with_ia([0x77, 0x88, 0x99], false));
    let mut bundle = relay_wrapping(request, vec![]);
    let outcome = pipeline.run(&mut bundle);
    assert!(matches!(outcome, Outcome::Respond));

    let response = finalize(&bundle);
    let Message::Advertise(adv) = response else {
        panic!("expected Advertise, got {response:?}");
    };
    let opts: Vec<DhcpOption> = adv.opts().iter().map(DhcpOption::from).collect();
    let iana = opts
        .iter()
        .find_map(|o| match o {
            DhcpOption::IANA(ia) => Some(ia),
            _ => None,
        })
        .expect("IA-NA in response");
    assert_eq!(iana.id, 1);
    let status = iana
        .opts
        .iter()
        .map(DhcpOption::from)
        .find_map(|o| match o {
            DhcpOption::StatusCode(s) => Some(s),
            _ => None,
        })
        .expect("status code in unanswered IA");
    assert_eq!(status.status, Status::NoAddrsAvail);
    assert!(!iana.opts.iter().map(DhcpOption::from).any(|o| matches!(o, DhcpOption::IAAddr(_))));
    Ok(())
}

/// Scenario 4: a keyed rate limiter trips on the 6th Solicit from the same
/// DUID within the window.
#[test]
fn sixth_solicit_within_window_is_rate_limited() {
    let handler = RateLimitHandler::new(RateLimitKey::Duid, 5, 30, 0);
    let pipeline = Pipeline::new(vec![
        Node::Handler(Box::new(handler)),
        Node::Handler(Box::new(UnansweredIaHandler::new(false))),
        Node::Handler(Box::new(RapidCommitHandler::new(false))),
    ]);

    for i in 0..5u8 {
        let request = Message::Solicit(solicit_with_ia([0x00, 0x00, i], false));
        let mut bundle = relay_wrapping(request, vec![]);
        let outcome = pipeline.run(&mut bundle);
        assert!(matches!(outcome, Outcome::Respond), "request {i} should be answered");
    }

    let request = Message::Solicit(solicit_with_ia([0x00, 0x00, 0x05], false));
    let mut bundle = relay_wrapping(request, vec![]);
    let outcome = pipeline.run(&mut bundle);
    assert!(matches!(
        outcome,
        Outcome::Silent { counter_bucket: "rate_limited" }
    ));
}

/// Scenario 5: an unknown option round-trips through the codec unchanged.
#[test]
fn unknown_option_round_trips() -> anyhow::Result<()> {
    let mut solicit = solicit_with_ia([0xaa, 0xbb, 0xcc], false);
    let code = OptionCode::from(65001u16);
    solicit
        .opts_mut()
        .insert(dhcproto::v6::SolicitOption::Unknown(DhcpOption::Unknown(UnknownOption::new(code, vec![0xDE, 0xAD, 0xBE, 0xEF]))));

    let mut buf = Vec::new();
    Message::Solicit(solicit).encode(&mut Encoder::new(&mut buf))?;

    let decoded = Message::decode(&mut Decoder::new(&buf))?;
    let Message::Solicit(decoded_solicit) = &decoded else {
        panic!("expected Solicit, got {decoded:?}");
    };
    let unknown = decoded_solicit
        .opts()
        .iter()
        .map(DhcpOption::from)
        .find_map(|o| match o {
            DhcpOption::Unknown(u) => Some(u),
            _ => None,
        })
        .expect("unknown option preserved");
    assert_eq!(unknown.code(), code);
    assert_eq!(unknown.data(), &[0xDE, 0xAD, 0xBE, 0xEF]);

    let mut reencoded = Vec::new();
    decoded.encode(&mut Encoder::new(&mut reencoded))?;
    assert_eq!(reencoded, buf);
    Ok(())
}

/// Scenario 6: a relay's interface-id is echoed back into the matching
/// `RelayRepl`.
#[test]
fn relay_interface_id_is_echoed_back() -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(vec![
        Node::Handler(Box::new(OptionCopyHandler::new(RelayOptionKind::InterfaceId))),
        Node::Handler(Box::new(UnansweredIaHandler::new(false))),
        Node::Handler(Box::new(RapidCommitHandler::new(false))),
    ]);
    pipeline.worker_init()?;

    let request = Message::Solicit(solicit_with_ia([0x01, 0x02, 0x03], false));
    let interface_id = DhcpOption::InterfaceId(InterfaceId { id: b"ge-0/0/0.100".to_vec() });
    let mut bundle = relay_wrapping(request, vec![interface_id]);
    let outcome = pipeline.run(&mut bundle);
    assert!(matches!(outcome, Outcome::Respond));

    let response = finalize(&bundle);
    let Message::RelayRepl(repl) = response else {
        panic!("expected RelayRepl, got {response:?}");
    };
    let echoed = repl
        .opts()
        .iter()
        .map(DhcpOption::from)
        .find_map(|o| match o {
            DhcpOption::InterfaceId(id) => Some(id),
            _ => None,
        })
        .expect("interface-id echoed in RelayRepl");
    assert_eq!(echoed.id, b"ge-0/0/0.100".to_vec());
    Ok(())
}
