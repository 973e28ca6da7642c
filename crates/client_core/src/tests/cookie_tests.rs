use super::*;

#[test]
fn finds_token_among_other_cookies() {
    let header = "sessionid=abc; csrftoken=tok123; theme=dark";
    assert_eq!(csrf_token(header).as_deref(), Some("tok123"));
}

#[test]
fn does_not_match_cookie_sharing_a_prefix() {
    let header = "csrftoken_old=stale; csrftoken=fresh";
    assert_eq!(get_cookie(header, "csrftoken").as_deref(), Some("fresh"));
    assert_eq!(get_cookie("csrftokenx=1", "csrftoken"), None);
}

#[test]
fn percent_decodes_but_keeps_plus_signs() {
    let header = "csrftoken=a%2Fb+c%3D";
    assert_eq!(csrf_token(header).as_deref(), Some("a/b+c="));
}

#[test]
fn empty_or_missing_cookie_yields_none() {
    assert_eq!(csrf_token(""), None);
    assert_eq!(csrf_token("sessionid=abc"), None);
}

#[test]
fn first_match_wins_and_empty_value_is_kept() {
    assert_eq!(get_cookie("a=; a=2", "a").as_deref(), Some(""));
}
