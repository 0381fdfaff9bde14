//! Contract Test: Route 53 HTTP API
//!
//! Constraints verified:
//! - Every request is signed
//! - List calls follow pagination to the end
//! - Path prefixes are stripped from zone and change ids
//! - Alias, routing-policy and unsupported record sets are not returned
//! - Client errors are rejections, outages are unavailability

use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonesync_core::model::RecordKind;
use zonesync_core::traits::{ChangeAction, ChangeRequest, ChangeStatus, ZoneProvider};
use zonesync_core::Error;
use zonesync_provider_route53::Route53Provider;

fn provider(server: &MockServer) -> Route53Provider {
    Route53Provider::with_endpoint(
        "AKIDEXAMPLE",
        "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
        Some("session-token".to_string()),
        &server.uri(),
    )
    .unwrap()
}

fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(body)
}

fn error_xml(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_string(format!(
        "<ErrorResponse><Error><Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error>\
         <RequestId>req-1</RequestId></ErrorResponse>",
        code, message
    ))
}

#[tokio::test]
async fn list_zones_follows_pagination_and_signs_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone"))
        .and(query_param("marker", "Z2"))
        .and(header_exists("authorization"))
        .respond_with(xml(
            "<ListHostedZonesResponse><HostedZones>\
             <HostedZone><Id>/hostedzone/Z2</Id><Name>b.com.</Name></HostedZone>\
             </HostedZones><IsTruncated>false</IsTruncated><MaxItems>1</MaxItems>\
             </ListHostedZonesResponse>",
        ))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(header_exists("x-amz-security-token"))
        .respond_with(xml(
            "<ListHostedZonesResponse><HostedZones>\
             <HostedZone><Id>/hostedzone/Z1</Id><Name>a.com.</Name></HostedZone>\
             </HostedZones><IsTruncated>true</IsTruncated><NextMarker>Z2</NextMarker>\
             <MaxItems>1</MaxItems></ListHostedZonesResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let zones = provider(&server).list_zones().await.unwrap();

    let ids: Vec<_> = zones.iter().map(|z| (z.id.as_str(), z.name.as_str())).collect();
    assert_eq!(ids, vec![("Z1", "a.com."), ("Z2", "b.com.")]);
}

#[tokio::test]
async fn list_record_sets_skips_alias_routed_and_unsupported_sets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone/Z1/rrset"))
        .and(query_param("name", "www.a.com."))
        .and(query_param("type", "CNAME"))
        .respond_with(xml(
            "<ListResourceRecordSetsResponse><ResourceRecordSets>\
             <ResourceRecordSet><Name>www.a.com.</Name><Type>CNAME</Type><TTL>60</TTL>\
             <ResourceRecords><ResourceRecord><Value>a.com.</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet>\
             </ResourceRecordSets><IsTruncated>false</IsTruncated><MaxItems>3</MaxItems>\
             </ListResourceRecordSetsResponse>",
        ))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone/Z1/rrset"))
        .respond_with(xml(
            "<ListResourceRecordSetsResponse><ResourceRecordSets>\
             <ResourceRecordSet><Name>a.com.</Name><Type>CAA</Type><TTL>300</TTL>\
             <ResourceRecords><ResourceRecord><Value>0 issue \"ca.example\"</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet>\
             <ResourceRecordSet><Name>a.com.</Name><Type>A</Type>\
             <AliasTarget><HostedZoneId>Z2FDTNDATAQYW2</HostedZoneId><DNSName>d1.cloudfront.net.</DNSName>\
             <EvaluateTargetHealth>false</EvaluateTargetHealth></AliasTarget>\
             </ResourceRecordSet>\
             <ResourceRecordSet><Name>api.a.com.</Name><Type>A</Type>\
             <SetIdentifier>blue</SetIdentifier><Weight>90</Weight><TTL>60</TTL>\
             <ResourceRecords><ResourceRecord><Value>192.0.2.10</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet>\
             <ResourceRecordSet><Name>a.com.</Name><Type>MX</Type><TTL>300</TTL>\
             <ResourceRecords><ResourceRecord><Value>10 mx1.a.com.</Value></ResourceRecord>\
             <ResourceRecord><Value>20 mx2.a.com.</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet>\
             </ResourceRecordSets><IsTruncated>true</IsTruncated>\
             <NextRecordName>www.a.com.</NextRecordName><NextRecordType>CNAME</NextRecordType>\
             <MaxItems>4</MaxItems></ListResourceRecordSetsResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sets = provider(&server).list_record_sets("Z1").await.unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].kind, RecordKind::Mx);
    assert_eq!(sets[0].ttl, 300);
    assert_eq!(sets[0].values, vec!["10 mx1.a.com.", "20 mx2.a.com."]);
    assert_eq!(sets[1].name, "www.a.com.");
    assert_eq!(sets[1].kind, RecordKind::Cname);
}

#[tokio::test]
async fn create_zone_returns_delegation_set_and_change() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2013-04-01/hostedzone"))
        .and(body_string_contains("<Name>example.com</Name>"))
        .and(body_string_contains("<CallerReference>"))
        .respond_with(ResponseTemplate::new(201).set_body_string(
            "<CreateHostedZoneResponse>\
             <HostedZone><Id>/hostedzone/ZNEW</Id><Name>example.com.</Name></HostedZone>\
             <ChangeInfo><Id>/change/CNEW</Id><Status>PENDING</Status></ChangeInfo>\
             <DelegationSet><NameServers>\
             <NameServer>ns-1.awsdns-01.org</NameServer><NameServer>ns-2.awsdns-02.com</NameServer>\
             </NameServers></DelegationSet></CreateHostedZoneResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let created = provider(&server).create_zone("example.com").await.unwrap();

    assert_eq!(created.id, "ZNEW");
    assert_eq!(created.name, "example.com.");
    assert_eq!(created.change_id, "CNEW");
    assert_eq!(
        created.delegation_nameservers,
        vec!["ns-1.awsdns-01.org", "ns-2.awsdns-02.com"]
    );
}

#[tokio::test]
async fn submit_change_sends_one_change_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2013-04-01/hostedzone/Z1/rrset"))
        .and(body_string_contains("<Comment>Managed by zonesync</Comment>"))
        .and(body_string_contains("<Action>DELETE</Action>"))
        .and(body_string_contains(
            "<Name>www.a.com.</Name><Type>A</Type><TTL>300</TTL>",
        ))
        .and(body_string_contains("<Value>192.0.2.1</Value>"))
        .respond_with(xml(
            "<ChangeResourceRecordSetsResponse><ChangeInfo>\
             <Id>/change/C42</Id><Status>PENDING</Status>\
             </ChangeInfo></ChangeResourceRecordSetsResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let change = ChangeRequest {
        action: ChangeAction::Delete,
        name: "www.a.com.".to_string(),
        kind: RecordKind::A,
        ttl: 300,
        values: vec!["192.0.2.1".to_string()],
        comment: "Managed by zonesync".to_string(),
    };
    let change_id = provider(&server).submit_change("Z1", &change).await.unwrap();

    assert_eq!(change_id, "C42");
}

#[tokio::test]
async fn change_status_is_reported_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/change/C42"))
        .respond_with(xml(
            "<GetChangeResponse><ChangeInfo><Id>/change/C42</Id><Status>INSYNC</Status>\
             <SubmittedAt>2024-01-15T08:00:00Z</SubmittedAt></ChangeInfo></GetChangeResponse>",
        ))
        .mount(&server)
        .await;

    let status = provider(&server).get_change_status("C42").await.unwrap();
    assert_eq!(status, ChangeStatus::InSync);
}

#[tokio::test]
async fn duplicate_record_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2013-04-01/hostedzone/Z1/rrset"))
        .respond_with(error_xml(
            400,
            "InvalidChangeBatch",
            "Tried to create resource record set but it already exists",
        ))
        .mount(&server)
        .await;

    let change = ChangeRequest {
        action: ChangeAction::Create,
        name: "www.a.com.".to_string(),
        kind: RecordKind::A,
        ttl: 60,
        values: vec!["192.0.2.1".to_string()],
        comment: "Managed by zonesync".to_string(),
    };
    let err = provider(&server).submit_change("Z1", &change).await.unwrap_err();

    match err {
        Error::ProviderRejected { provider, message } => {
            assert_eq!(provider, "route53");
            assert!(message.starts_with("InvalidChangeBatch: "));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_zone_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone/ZGONE"))
        .respond_with(error_xml(
            404,
            "NoSuchHostedZone",
            "No hosted zone found with ID: ZGONE",
        ))
        .mount(&server)
        .await;

    let err = provider(&server).get_zone("ZGONE").await.unwrap_err();
    assert!(matches!(err, Error::ProviderRejected { .. }));
}

#[tokio::test]
async fn outage_and_auth_failures_are_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/2013-04-01/hostedzone/Z1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2013-04-01/hostedzone"))
        .respond_with(error_xml(403, "InvalidClientTokenId", "The security token is invalid"))
        .mount(&server)
        .await;

    let provider = provider(&server);

    let err = provider.delete_zone("Z1").await.unwrap_err();
    assert!(err.is_transient());

    let err = provider.list_zones().await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("InvalidClientTokenId"));
}

#[tokio::test]
async fn unreachable_endpoint_is_unavailable() {
    // A pooled server keeps listening after drop; use a standalone one
    let server = MockServer::builder().start().await;
    let provider = provider(&server);
    drop(server);

    let err = provider.list_zones().await.unwrap_err();
    assert!(matches!(err, Error::ProviderUnavailable { .. }));
}
