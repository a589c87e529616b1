use replaycast::adblock::is_blocked;

#[test]
fn ad_and_telemetry_hosts_are_aborted() {
    for url in [
        "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js",
        "https://securepubads.g.doubleclick.net/tag/js/gpt.js",
        "https://c.amazon-adsystem.com/aax2/apstag.js",
        "https://ib.adnxs.com/ut/v3/prebid",
        "https://cdn.matomo.cloud/matomo.js",
        "https://js.sentry-cdn.com/abc123.min.js",
        "https://cdn.intergient.com/pageos/pageos.js",
        "https://www.googletagmanager.com/gtag/js",
    ] {
        assert!(is_blocked(url), "expected block: {url}");
    }
}

#[test]
fn game_traffic_is_left_alone() {
    for url in [
        "https://tetr.io/",
        "https://tetr.io/api/users/me",
        "https://tetr.io/about/patchnotes/notes.json",
        "https://tetr.io/res/se/hit.mp3",
        "wss://tetr.io/ribbon",
    ] {
        assert!(!is_blocked(url), "expected pass: {url}");
    }
}
