use ua_parser::{
    BasicResolver, CachingResolver, Domain, FilteredResolver, Lru, Matchers, Parser, Resolver,
    RuleFile, S3Fifo, Sieve,
};

/// Excerpt of the canonical ruleset covering the end-to-end scenarios;
/// rule shapes (patterns, replacements, flags) follow `regexes.yaml`.
const RULES: &str = r#"
user_agent_parsers:
- regex: '(Chromium|Chrome)/(\d+)\.(\d+)(?:\.(\d+))?(?:\.(\d+))?'
- regex: '(Firefox)/(\d+)\.(\d+)'
  family_replacement: '$1 Mobile'
os_parsers:
- regex: '(Mac OS X) (\d+)[_.](\d+)(?:[_.](\d+))?'
- regex: '(Windows NT) (\d+)\.(\d+)'
  os_replacement: 'Windows'
device_parsers:
- regex: 'Macintosh'
  device_replacement: 'Mac'
  brand_replacement: 'Apple'
  model_replacement: 'Mac'
- regex: '(iPhone)'
  regex_flag: 'i'
  device_replacement: 'iPhone'
  brand_replacement: 'Apple'
  model_replacement: '$1'
"#;

const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2272.104 Safari/537.36";

fn rules() -> RuleFile {
    serde_yaml::from_str(RULES).unwrap()
}

fn matchers() -> Matchers {
    rules().try_into().unwrap()
}

fn assert_scenarios(resolver: &dyn Resolver) {
    // Full extraction across all three facets.
    let r = resolver.resolve(CHROME_MAC, Domain::ALL);
    assert_eq!(r.domains, Domain::ALL);
    let ua = r.user_agent.as_ref().unwrap();
    assert_eq!(ua.family, "Chrome");
    assert_eq!(ua.major.as_deref(), Some("41"));
    assert_eq!(ua.minor.as_deref(), Some("0"));
    assert_eq!(ua.patch.as_deref(), Some("2272"));
    assert_eq!(ua.patch_minor.as_deref(), Some("104"));
    let os = r.os.as_ref().unwrap();
    assert_eq!(os.family, "Mac OS X");
    assert_eq!(os.major.as_deref(), Some("10"));
    assert_eq!(os.minor.as_deref(), Some("9"));
    assert_eq!(os.patch.as_deref(), Some("4"));
    assert_eq!(os.patch_minor, None);
    let device = r.device.as_ref().unwrap();
    assert_eq!(device.family, "Mac");
    assert_eq!(device.brand.as_deref(), Some("Apple"));
    assert_eq!(device.model.as_deref(), Some("Mac"));

    // The empty string matches nothing anywhere.
    let r = resolver.resolve("", Domain::ALL);
    assert!(r.user_agent.is_none() && r.os.is_none() && r.device.is_none());
    let defaulted = r.complete().unwrap().with_defaults();
    assert_eq!(defaulted.user_agent.family, "Other");
    assert_eq!(defaulted.os.family, "Other");
    assert_eq!(defaulted.device.family, "Other");
    assert_eq!(defaulted.string, "");

    // OS-only input: the other facets stay unmatched.
    let r = resolver.resolve("something Windows NT 10.0 something", Domain::ALL);
    assert!(r.user_agent.is_none());
    assert_eq!(r.os.as_ref().unwrap().family, "Windows");
    assert_eq!(r.os.as_ref().unwrap().major.as_deref(), Some("10"));
    assert!(r.device.is_none());

    // Family template with a back-reference.
    let r = resolver.resolve("Mozilla/5.0 Firefox/120.0", Domain::USER_AGENT);
    assert_eq!(r.user_agent.as_ref().unwrap().family, "Firefox Mobile");

    // Case-insensitive device rule; substitution stays verbatim.
    let d = resolver
        .resolve("some iphone thing", Domain::DEVICE)
        .device
        .unwrap();
    assert_eq!(d.family, "iPhone");
    assert_eq!(d.brand.as_deref(), Some("Apple"));
    assert_eq!(d.model.as_deref(), Some("iphone"));
}

#[test]
fn basic_resolver_scenarios() {
    assert_scenarios(&BasicResolver::new(matchers()));
}

#[test]
fn filtered_resolver_scenarios() {
    assert_scenarios(&FilteredResolver::new(matchers()).unwrap());
}

#[test]
fn cached_stacks_scenarios() {
    assert_scenarios(&CachingResolver::new(
        BasicResolver::new(matchers()),
        Lru::new(16),
    ));
    assert_scenarios(&CachingResolver::new(
        FilteredResolver::new(matchers()).unwrap(),
        S3Fifo::new(16),
    ));
    // Twice over the same wrapper so the second pass is all hits.
    let cached = CachingResolver::new(BasicResolver::new(matchers()), Sieve::new(16));
    assert_scenarios(&cached);
    assert_scenarios(&cached);
}

#[test]
fn resolvers_agree() {
    let basic = BasicResolver::new(matchers());
    let filtered = FilteredResolver::new(matchers()).unwrap();
    for ua in [
        CHROME_MAC,
        "",
        "Mozilla/5.0 Firefox/120.0",
        "something Windows NT 10.0 something",
        "some iphone thing",
        "complete gibberish \u{1F980}",
    ] {
        assert_eq!(
            basic.resolve(ua, Domain::ALL),
            filtered.resolve(ua, Domain::ALL),
            "disagreement on {ua:?}",
        );
    }
}

#[test]
fn facet_values_do_not_depend_on_the_request() {
    let resolver = BasicResolver::new(matchers());
    let subsets = [
        Domain::empty(),
        Domain::USER_AGENT,
        Domain::OS,
        Domain::DEVICE,
        Domain::USER_AGENT | Domain::OS,
        Domain::OS | Domain::DEVICE,
        Domain::ALL,
    ];
    for ua in [CHROME_MAC, "", "some iphone thing"] {
        let full = resolver.resolve(ua, Domain::ALL);
        for &domains in &subsets {
            let r = resolver.resolve(ua, domains);
            assert_eq!(r.domains, domains);
            assert_eq!(
                r.user_agent,
                domains
                    .contains(Domain::USER_AGENT)
                    .then(|| full.user_agent.clone())
                    .flatten()
            );
            assert_eq!(
                r.os,
                domains
                    .contains(Domain::OS)
                    .then(|| full.os.clone())
                    .flatten()
            );
            assert_eq!(
                r.device,
                domains
                    .contains(Domain::DEVICE)
                    .then(|| full.device.clone())
                    .flatten()
            );
        }
    }
}

#[test]
fn parser_facade_end_to_end() {
    let parser = Parser::new(CachingResolver::new(
        FilteredResolver::new(matchers()).unwrap(),
        Lru::new(64),
    ));

    let r = parser.parse(CHROME_MAC);
    assert_eq!(r.user_agent.unwrap().family, "Chrome");
    assert_eq!(r.os.unwrap().family, "Mac OS X");
    assert_eq!(r.device.unwrap().family, "Mac");
    assert_eq!(r.string, CHROME_MAC);

    assert_eq!(
        parser.parse_user_agent(CHROME_MAC).unwrap().family,
        "Chrome"
    );
    assert_eq!(parser.parse_os(CHROME_MAC).unwrap().family, "Mac OS X");
    assert_eq!(parser.parse_device(CHROME_MAC).unwrap().family, "Mac");
    assert_eq!(parser.parse_user_agent(""), None);

    // The clone shares the resolver stack (and therefore the cache).
    let clone = parser.clone();
    assert_eq!(clone.parse(CHROME_MAC), parser.parse(CHROME_MAC));
}

#[test]
fn loaders_from_files() {
    let dir = std::env::temp_dir();
    let yaml_path = dir.join("ua-parser-test-rules.yaml");
    std::fs::write(&yaml_path, RULES).unwrap();
    let matchers = ua_parser::load_yaml(&yaml_path).unwrap();
    std::fs::remove_file(&yaml_path).unwrap();
    assert_scenarios(&BasicResolver::new(matchers));

    let json_path = dir.join("ua-parser-test-rules.json");
    let json = serde_json::to_string(&serde_yaml::from_str::<serde_json::Value>(RULES).unwrap())
        .unwrap();
    std::fs::write(&json_path, json).unwrap();
    let matchers = ua_parser::load_json(&json_path).unwrap();
    std::fs::remove_file(&json_path).unwrap();
    assert_scenarios(&BasicResolver::new(matchers));
}

/// Deterministic heavy-tailed workload: key `k` recurs roughly every
/// `k + 1` rounds, so low-numbered keys dominate. Used as a
/// regression guard for the scan-resistant policies' hit rates
/// relative to LRU at the same capacity.
fn workload() -> Vec<String> {
    let mut keys = Vec::new();
    for round in 0..100usize {
        for k in 0..50usize {
            if round % (k + 1) == 0 {
                keys.push(format!("ua-{k}"));
            }
        }
    }
    keys
}

fn hit_rate(cache: &dyn ua_parser::Cache, keys: &[String]) -> usize {
    use ua_parser::PartialResult;
    let mut hits = 0;
    for key in keys {
        if cache.get(key).is_some() {
            hits += 1;
        } else {
            cache.put(
                key,
                PartialResult {
                    domains: Domain::ALL,
                    user_agent: None,
                    os: None,
                    device: None,
                    string: key.clone(),
                },
            );
        }
    }
    hits
}

#[test]
fn scan_resistant_policies_track_lru() {
    let keys = workload();
    let lru = hit_rate(&Lru::new(16), &keys);
    let sieve = hit_rate(&Sieve::new(16), &keys);
    let s3 = hit_rate(&S3Fifo::new(16), &keys);

    assert!(lru > 0);
    // Documented floor: within 25% of LRU on the reference workload.
    assert!(
        sieve * 4 >= lru * 3,
        "sieve hit count {sieve} fell too far below lru {lru}"
    );
    assert!(
        s3 * 4 >= lru * 3,
        "s3-fifo hit count {s3} fell too far below lru {lru}"
    );
}
