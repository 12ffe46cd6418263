use cas_response::{
    AnyAttribute, Attributes, DecodeError, EncodeError, FailureCode, NamedAttribute,
    ServiceResponse, UserAttributes, decode, encode, timestamp,
};
use chrono::{TimeZone, Utc};

fn full_success() -> ServiceResponse {
    let mut response = ServiceResponse::success("jdoe", "PGTIOU-84678-8a9d2");
    let success = response.success_mut().unwrap();
    success.add_proxy("https://proxy2.example.org/pgtUrl");
    success.add_proxy("https://proxy1.example.org/pgtUrl");

    let mut user_attributes = UserAttributes::default();
    user_attributes.add_attribute("mail", "jdoe@example.org");
    user_attributes.attributes.push(NamedAttribute {
        name: None,
        value: "<given>John</given>".into(),
    });
    user_attributes
        .any_attributes
        .push(AnyAttribute::new("eduPersonAffiliation", "staff & faculty"));

    success.attributes = Some(Attributes {
        authentication_date: Some(timestamp::parse("2025-07-22T02:04:29.974Z[UTC]").unwrap()),
        long_term_authentication_request_token_used: true,
        is_from_new_login: false,
        member_of: vec!["cn=staff,ou=groups".into(), "cn=vpn,ou=groups".into()],
        user_attributes: Some(user_attributes),
        extra_attributes: vec![AnyAttribute::new("successfulAuthenticationHandlers", "Ldap")],
    });
    success
        .extra_attributes
        .push(AnyAttribute::new("customField", "x"));
    response
}

#[test]
fn compact_round_trip() {
    for response in [
        full_success(),
        ServiceResponse::success("jdoe", ""),
        ServiceResponse::failure(FailureCode::InvalidTicket, "Ticket ST-123 not recognized"),
        ServiceResponse::failure("INVALID_REQUEST", "<b>service</b> &amp; ticket required"),
    ] {
        let bytes = encode(&response, 0).unwrap();
        assert_eq!(decode(&bytes).unwrap(), response);
    }
}

#[test]
fn indented_round_trip() {
    let response = full_success();
    let bytes = encode(&response, 4).unwrap();
    assert_eq!(decode(&bytes).unwrap(), response);
}

#[test]
fn indent_width_controls_whitespace() {
    let response = ServiceResponse::success("jdoe", "PGT-1");

    let compact = String::from_utf8(encode(&response, 0).unwrap().to_vec()).unwrap();
    assert!(!compact.contains('\n'));
    assert!(!compact.contains("> <"));
    assert!(compact.contains("<user>jdoe</user><proxyGrantingTicket>PGT-1</proxyGrantingTicket>"));

    let pretty = String::from_utf8(encode(&response, 2).unwrap().to_vec()).unwrap();
    let lines: Vec<&str> = pretty.lines().collect();
    assert_eq!(lines[1], "  <authenticationSuccess>");
    assert_eq!(lines[2], "    <user>jdoe</user>");
    assert_eq!(lines[3], "    <proxyGrantingTicket>PGT-1</proxyGrantingTicket>");
    assert_eq!(lines[4], "  </authenticationSuccess>");
}

#[test]
fn zone_annotation_is_not_emitted() {
    let bytes = encode(&full_success(), 0).unwrap();
    let xml = std::str::from_utf8(&bytes).unwrap();
    assert!(xml.contains("<authenticationDate>2025-07-22T02:04:29.974Z</authenticationDate>"));
    assert!(!xml.contains("[UTC]"));
}

#[test]
fn cas_server_document() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
    <cas:authenticationSuccess>
        <cas:user>casuser</cas:user>
        <cas:attributes>
            <cas:authenticationDate>2025-07-22T02:04:29.974Z[UTC]</cas:authenticationDate>
            <cas:longTermAuthenticationRequestTokenUsed>false</cas:longTermAuthenticationRequestTokenUsed>
            <cas:isFromNewLogin>true</cas:isFromNewLogin>
            <cas:clientIpAddress>127.0.0.1</cas:clientIpAddress>
        </cas:attributes>
    </cas:authenticationSuccess>
</cas:serviceResponse>
"#;
    let response = decode(xml.as_bytes()).unwrap();
    assert_eq!(response.user(), Some("casuser"));

    let attributes = response.success_ref().unwrap().attributes.as_ref().unwrap();
    assert_eq!(
        attributes.authentication_date,
        Some(timestamp::parse("2025-07-22T02:04:29.974Z").unwrap())
    );
    assert!(attributes.is_from_new_login);
    assert_eq!(
        attributes.extra_attributes,
        vec![AnyAttribute::new("clientIpAddress", "127.0.0.1")]
    );
}

#[test]
fn failure_document() {
    let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
    <cas:authenticationFailure code="INVALID_TICKET">Ticket ST-123 not recognized</cas:authenticationFailure>
</cas:serviceResponse>"#;
    let response = ServiceResponse::from_xml(xml.as_bytes()).unwrap();
    let failure = response.failure_ref().unwrap();
    assert_eq!(failure.code, "INVALID_TICKET");
    assert_eq!(failure.failure_code(), Some(FailureCode::InvalidTicket));
    assert_eq!(failure.message, "Ticket ST-123 not recognized");
    assert!(response.success_ref().is_none());
}

#[test]
fn decode_errors_return_no_response() {
    let both = r#"<serviceResponse xmlns="http://www.yale.edu/tp/cas">
  <authenticationFailure code="INVALID_TICKET">x</authenticationFailure>
  <authenticationSuccess><user>u</user></authenticationSuccess>
</serviceResponse>"#;
    assert_eq!(
        decode(both.as_bytes()).unwrap_err(),
        DecodeError::ConflictingOutcome
    );

    let bad_date = r#"<serviceResponse xmlns="http://www.yale.edu/tp/cas">
  <authenticationSuccess><user>u</user>
    <attributes><authenticationDate>2025-07-22[UTC]</authenticationDate></attributes>
  </authenticationSuccess>
</serviceResponse>"#;
    assert!(matches!(
        decode(bad_date.as_bytes()).unwrap_err(),
        DecodeError::Timestamp(_)
    ));
}

#[test]
fn prefixed_extension_is_refused_not_renamed() {
    let mut response = ServiceResponse::success("jdoe", "");
    response
        .success_mut()
        .unwrap()
        .extra_attributes
        .push(AnyAttribute::new("cas:extra", "v"));
    assert_eq!(
        encode(&response, 0).unwrap_err(),
        EncodeError::InvalidName("cas:extra".into())
    );

    // A prefixed extension read from a CAS server comes back by local name,
    // and that value does round-trip.
    let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationSuccess><cas:user>jdoe</cas:user><cas:extra>v</cas:extra></cas:authenticationSuccess>
</cas:serviceResponse>"#;
    let decoded = decode(xml.as_bytes()).unwrap();
    assert_eq!(
        decoded.success_ref().unwrap().extra_attributes,
        vec![AnyAttribute::new("extra", "v")]
    );
    assert_eq!(decode(&encode(&decoded, 2).unwrap()).unwrap(), decoded);
}

#[test]
fn encoded_dates_always_decode() {
    let in_range = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
    let mut response = ServiceResponse::success("jdoe", "");
    response.success_mut().unwrap().attributes = Some(Attributes {
        authentication_date: Some(in_range),
        ..Default::default()
    });
    assert_eq!(decode(&encode(&response, 0).unwrap()).unwrap(), response);

    let beyond = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
    response.success_mut().unwrap().attributes = Some(Attributes {
        authentication_date: Some(beyond),
        ..Default::default()
    });
    assert_eq!(
        encode(&response, 0).unwrap_err(),
        EncodeError::DateOutOfRange(beyond)
    );
}
