use crate::v6::DhcpOption;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// option code type, see the [IANA registry](https://www.iana.org/assignments/dhcpv6-parameters/dhcpv6-parameters.xhtml#dhcpv6-parameters-2)
/// for the full list -- codes this crate has no concrete type for still
/// round trip through `DhcpOption::Unknown`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionCode {
    /// 1
    ClientId, // should duid for this be bytes or string?
    /// 2
    ServerId,
    /// 3
    IANA,
    /// 4
    IATA,
    /// 5
    IAAddr,
    /// 6
    ORO,
    /// 7
    Preference,
    /// 8
    ElapsedTime,
    /// 9
    RelayMsg,
    /// 11
    Auth,
    /// 12
    Unicast,
    /// 13
    StatusCode,
    /// 14
    RapidCommit,
    /// 15
    UserClass,
    /// 16
    VendorClass,
    /// 17
    VendorOpts,
    /// 18
    InterfaceId,
    /// 19
    ReconfMsg,
    /// 20
    ReconfAccept,
    /// 21
    SipServerD,
    /// 22
    SipServerA,
    /// 23
    DNSServers,
    /// 24
    DomainList,
    /// 25
    IAPD,
    /// 26
    IAPrefix,
    /// 27
    NisServers,
    /// 28
    NispServers,
    /// 29
    NisDomainName,
    /// 30
    NispDomainName,
    /// 31
    SntpServers,
    /// 32
    InformationRefreshTime,
    /// 33
    BcmcsServerD,
    /// 34
    BcmcsServerA,
    /// 36
    GeoconfCivic,
    /// 37
    RemoteId,
    /// 38
    SubscriberId,
    /// 39
    ClientFqdn,
    /// 40
    PanaAgent,
    /// 41
    NewPosixTimezone,
    /// 42
    NewTzdbTimezone,
    /// 43
    Ero,
    /// 44, RFC5007
    LqQuery,
    /// 45, RFC5007
    ClientData,
    /// 46, RFC5007
    CltTime,
    /// 47, RFC5007
    LqRelayData,
    /// 48, RFC5007
    LqClientLink,
    /// 49
    Mip6Hnidf,
    /// 50
    Mip6Vdinf,
    /// 51
    V6Lost,
    /// 52
    CapwapAcV6,
    /// 53, RFC5460
    RelayId,
    /// 54
    Ipv6AddressMoS,
    /// 55
    Ipv6FQDNMoS,
    /// 56
    NtpServer,
    /// 57
    V6AccessDomain,
    /// 58
    SipUaCsList,
    /// 59
    OptBootfileUrl,
    /// 60
    OptBootfileParam,
    /// 61
    ClientArchType,
    /// 62
    Nii,
    /// 63
    Geolocation,
    /// 64
    AftrName,
    /// 65
    ErpLocalDomainName,
    /// 66
    Rsoo,
    /// 67
    PdExclude,
    /// 68
    Vss,
    /// 69
    Mip6Idinf,
    /// 70
    Mip6Udinf,
    /// 71
    Mip6Hnp,
    /// 72
    Mip6Haa,
    /// 73
    Mip6Haf,
    /// 74
    RdnssSelection,
    /// 75
    KrbPrincipalName,
    /// 76
    KrbRealmName,
    /// 77
    KrbDefaultRealmName,
    /// 78
    KrbKdc,
    /// 79
    ClientLinklayerAddr,
    /// 80, RFC6977 bulk leasequery
    LinkAddress,
    /// 81
    Radius,
    /// 82
    SolMaxRt,
    /// 83
    InfMaxRt,
    /// 84
    Addrsel,
    /// 85
    AddrselTable,
    /// 86
    V6PcpServer,
    /// 88
    Dhcp4ODhcp6Server,
    /// 94
    S46ContMape,
    /// 95
    S46ContMapt,
    /// 96
    S46ContLw,
    /// 97
    _4Rd,
    /// 98
    _4RdMapRule,
    /// 99
    _4RdNonMapRule,
    /// 103
    DhcpCaptivePortal,
    /// 108
    MplParameters,
    /// 109
    S46Priority,
    /// 113
    V6Prefix64,
    /// 143
    Ipv6AddressANDSF,
    /// an unknown or unimplemented option type
    Unknown(u16),
}

impl PartialOrd for OptionCode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OptionCode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        u16::from(*self).cmp(&u16::from(*other))
    }
}

impl From<OptionCode> for u16 {
    fn from(opt: OptionCode) -> Self {
        use OptionCode::*;
        match opt {
            ClientId => 1,
            ServerId => 2,
            IANA => 3,
            IATA => 4,
            IAAddr => 5,
            ORO => 6,
            Preference => 7,
            ElapsedTime => 8,
            RelayMsg => 9,
            Auth => 11,
            Unicast => 12,
            StatusCode => 13,
            RapidCommit => 14,
            UserClass => 15,
            VendorClass => 16,
            VendorOpts => 17,
            InterfaceId => 18,
            ReconfMsg => 19,
            ReconfAccept => 20,
            SipServerD => 21,
            SipServerA => 22,
            DNSServers => 23,
            DomainList => 24,
            IAPD => 25,
            IAPrefix => 26,
            NisServers => 27,
            NispServers => 28,
            NisDomainName => 29,
            NispDomainName => 30,
            SntpServers => 31,
            InformationRefreshTime => 32,
            BcmcsServerD => 33,
            BcmcsServerA => 34,
            GeoconfCivic => 36,
            RemoteId => 37,
            SubscriberId => 38,
            ClientFqdn => 39,
            PanaAgent => 40,
            NewPosixTimezone => 41,
            NewTzdbTimezone => 42,
            Ero => 43,
            LqQuery => 44,
            ClientData => 45,
            CltTime => 46,
            LqRelayData => 47,
            LqClientLink => 48,
            Mip6Hnidf => 49,
            Mip6Vdinf => 50,
            V6Lost => 51,
            CapwapAcV6 => 52,
            RelayId => 53,
            Ipv6AddressMoS => 54,
            Ipv6FQDNMoS => 55,
            NtpServer => 56,
            V6AccessDomain => 57,
            SipUaCsList => 58,
            OptBootfileUrl => 59,
            OptBootfileParam => 60,
            ClientArchType => 61,
            Nii => 62,
            Geolocation => 63,
            AftrName => 64,
            ErpLocalDomainName => 65,
            Rsoo => 66,
            PdExclude => 67,
            Vss => 68,
            Mip6Idinf => 69,
            Mip6Udinf => 70,
            Mip6Hnp => 71,
            Mip6Haa => 72,
            Mip6Haf => 73,
            RdnssSelection => 74,
            KrbPrincipalName => 75,
            KrbRealmName => 76,
            KrbDefaultRealmName => 77,
            KrbKdc => 78,
            ClientLinklayerAddr => 79,
            LinkAddress => 80,
            Radius => 81,
            SolMaxRt => 82,
            InfMaxRt => 83,
            Addrsel => 84,
            AddrselTable => 85,
            V6PcpServer => 86,
            Dhcp4ODhcp6Server => 88,
            S46ContMape => 94,
            S46ContMapt => 95,
            S46ContLw => 96,
            _4Rd => 97,
            _4RdMapRule => 98,
            _4RdNonMapRule => 99,
            DhcpCaptivePortal => 103,
            MplParameters => 108,
            S46Priority => 109,
            V6Prefix64 => 113,
            Ipv6AddressANDSF => 143,
            Unknown(n) => n,
        }
    }
}

impl From<u16> for OptionCode {
    fn from(n: u16) -> Self {
        use OptionCode::*;
        match n {
            1 => ClientId,
            2 => ServerId,
            3 => IANA,
            4 => IATA,
            5 => IAAddr,
            6 => ORO,
            7 => Preference,
            8 => ElapsedTime,
            9 => RelayMsg,
            11 => Auth,
            12 => Unicast,
            13 => StatusCode,
            14 => RapidCommit,
            15 => UserClass,
            16 => VendorClass,
            17 => VendorOpts,
            18 => InterfaceId,
            19 => ReconfMsg,
            20 => ReconfAccept,
            21 => SipServerD,
            22 => SipServerA,
            23 => DNSServers,
            24 => DomainList,
            25 => IAPD,
            26 => IAPrefix,
            27 => NisServers,
            28 => NispServers,
            29 => NisDomainName,
            30 => NispDomainName,
            31 => SntpServers,
            32 => InformationRefreshTime,
            33 => BcmcsServerD,
            34 => BcmcsServerA,
            36 => GeoconfCivic,
            37 => RemoteId,
            38 => SubscriberId,
            39 => ClientFqdn,
            40 => PanaAgent,
            41 => NewPosixTimezone,
            42 => NewTzdbTimezone,
            43 => Ero,
            44 => LqQuery,
            45 => ClientData,
            46 => CltTime,
            47 => LqRelayData,
            48 => LqClientLink,
            49 => Mip6Hnidf,
            50 => Mip6Vdinf,
            51 => V6Lost,
            52 => CapwapAcV6,
            53 => RelayId,
            54 => Ipv6AddressMoS,
            55 => Ipv6FQDNMoS,
            56 => NtpServer,
            57 => V6AccessDomain,
            58 => SipUaCsList,
            59 => OptBootfileUrl,
            60 => OptBootfileParam,
            61 => ClientArchType,
            62 => Nii,
            63 => Geolocation,
            64 => AftrName,
            65 => ErpLocalDomainName,
            66 => Rsoo,
            67 => PdExclude,
            68 => Vss,
            69 => Mip6Idinf,
            70 => Mip6Udinf,
            71 => Mip6Hnp,
            72 => Mip6Haa,
            73 => Mip6Haf,
            74 => RdnssSelection,
            75 => KrbPrincipalName,
            76 => KrbRealmName,
            77 => KrbDefaultRealmName,
            78 => KrbKdc,
            79 => ClientLinklayerAddr,
            80 => LinkAddress,
            81 => Radius,
            82 => SolMaxRt,
            83 => InfMaxRt,
            84 => Addrsel,
            85 => AddrselTable,
            86 => V6PcpServer,
            88 => Dhcp4ODhcp6Server,
            94 => S46ContMape,
            95 => S46ContMapt,
            96 => S46ContLw,
            97 => _4Rd,
            98 => _4RdMapRule,
            99 => _4RdNonMapRule,
            103 => DhcpCaptivePortal,
            108 => MplParameters,
            109 => S46Priority,
            113 => V6Prefix64,
            143 => Ipv6AddressANDSF,
            _ => Unknown(n),
        }
    }
}

impl From<&DhcpOption> for OptionCode {
    fn from(opt: &DhcpOption) -> Self {
        use DhcpOption::*;
        match opt {
            ClientId(_) => OptionCode::ClientId,
            ServerId(_) => OptionCode::ServerId,
            IANA(_) => OptionCode::IANA,
            IATA(_) => OptionCode::IATA,
            IAAddr(_) => OptionCode::IAAddr,
            ORO(_) => OptionCode::ORO,
            Preference(_) => OptionCode::Preference,
            ElapsedTime(_) => OptionCode::ElapsedTime,
            RelayMsg(_) => OptionCode::RelayMsg,
            Auth(_) => OptionCode::Auth,
            Unicast(_) => OptionCode::Unicast,
            StatusCode(_) => OptionCode::StatusCode,
            RapidCommit(_) => OptionCode::RapidCommit,
            UserClass(_) => OptionCode::UserClass,
            VendorClass(_) => OptionCode::VendorClass,
            VendorOpts(_) => OptionCode::VendorOpts,
            InterfaceId(_) => OptionCode::InterfaceId,
            ReconfMsg(_) => OptionCode::ReconfMsg,
            ReconfAccept(_) => OptionCode::ReconfAccept,
            DNSServers(_) => OptionCode::DNSServers,
            DomainList(_) => OptionCode::DomainList,
            IAPD(_) => OptionCode::IAPD,
            IAPrefix(_) => OptionCode::IAPrefix,
            InformationRefreshTime(_) => OptionCode::InformationRefreshTime,
            SolMaxRt(_) => OptionCode::SolMaxRt,
            InfMaxRt(_) => OptionCode::InfMaxRt,
            LqQuery(_) => OptionCode::LqQuery,
            ClientData(_) => OptionCode::ClientData,
            CltTime(_) => OptionCode::CltTime,
            LqRelayData(_) => OptionCode::LqRelayData,
            LqClientLink(_) => OptionCode::LqClientLink,
            RelayId(_) => OptionCode::RelayId,
            LinkAddress(_) => OptionCode::LinkAddress,
            Unknown(unknown) => unknown.into(),
        }
    }
}
