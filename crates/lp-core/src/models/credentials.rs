use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Every secret the deployment system knows how to consume. Resolution reads
/// exactly this list; anything else in the process environment is ignored.
pub const SECRET_NAMES: &[&str] = &[
    "RAILWAY_TOKEN",
    "VERCEL_TOKEN",
    "RENDER_API_KEY",
    "GITHUB_TOKEN",
    "GODADDY_API_KEY",
    "GODADDY_SECRET",
    "SENDGRID_API_KEY",
    "MAILGUN_API_KEY",
    "MAILGUN_DOMAIN",
    "MAILCHIMP_API_KEY",
    "MAILCHIMP_SERVER",
    "SENTRY_DSN",
    "DATADOG_API_KEY",
    "DATADOG_APP_KEY",
    "OPENAI_API_KEY",
    "STRIPE_SECRET_KEY",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_USER_ID",
    "PRICE_ID",
    "SECRET_KEY",
];

/// Resolved secret map. Built once at process start, immutable afterward.
/// An absent secret (`None`) is distinct from one set to the empty string.
#[derive(Clone)]
pub struct Credentials {
    values: BTreeMap<String, Option<String>>,
}

impl Credentials {
    /// Resolve the fixed secret list from the process environment.
    /// Missing variables are not an error; stages that need them report
    /// their own fatal or degraded outcome later.
    pub fn from_env() -> Self {
        let values = SECRET_NAMES
            .iter()
            .map(|&name| (name.to_string(), std::env::var(name).ok()))
            .collect();
        Self { values }
    }

    /// Build from an explicit map. Names outside the fixed list are kept,
    /// so embedding callers can thread extra variables through.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values: BTreeMap<String, Option<String>> = SECRET_NAMES
            .iter()
            .map(|&name| (name.to_string(), None))
            .collect();
        for (k, v) in entries {
            values.insert(k.into(), Some(v.into()));
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of resolved secrets out of the known list.
    pub fn resolved_count(&self) -> (usize, usize) {
        let set = self.values.values().filter(|v| v.is_some()).count();
        (set, self.values.len())
    }

    /// Evaluate the fixed capability checklist.
    pub fn readiness(&self) -> Readiness {
        let r = Readiness {
            railway: self.has("RAILWAY_TOKEN"),
            vercel: self.has("VERCEL_TOKEN"),
            render: self.has("RENDER_API_KEY"),
            source_control: self.has("GITHUB_TOKEN"),
            domain_management: self.has("GODADDY_API_KEY") && self.has("GODADDY_SECRET"),
            mailchimp: self.has("MAILCHIMP_API_KEY"),
            sendgrid: self.has("SENDGRID_API_KEY"),
            mailgun: self.has("MAILGUN_API_KEY"),
            openai: self.has("OPENAI_API_KEY"),
            stripe: self.has("STRIPE_SECRET_KEY"),
            telegram: self.has("TELEGRAM_BOT_TOKEN"),
            passed: 0,
            total: 0,
        };
        r.scored()
    }

    /// Build the environment map injected into a deployment: every present
    /// product secret, the fixed runtime defaults, and per-platform extras.
    pub fn deployment_env(&self, platform_id: &str) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        for name in [
            "OPENAI_API_KEY",
            "STRIPE_SECRET_KEY",
            "SECRET_KEY",
            "PRICE_ID",
            "TELEGRAM_BOT_TOKEN",
            "TELEGRAM_USER_ID",
        ] {
            if let Some(value) = self.get(name) {
                env.insert(name.to_string(), value.to_string());
            }
        }
        env.insert("APP_ENV".into(), "production".into());
        match platform_id {
            "railway" => {
                env.insert("PORT".into(), "5000".into());
                env.insert("RAILWAY_ENVIRONMENT".into(), "production".into());
            }
            "vercel" => {
                env.insert("VERCEL_ENV".into(), "production".into());
            }
            "render" => {
                env.insert("RENDER_ENV".into(), "production".into());
            }
            _ => {}
        }
        env
    }
}

// Secret values must never reach logs; Debug shows presence only.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.values {
            map.entry(name, &if value.is_some() { "<set>" } else { "<unset>" });
        }
        map.finish()
    }
}

/// Fixed capability checklist, used only for reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub railway: bool,
    pub vercel: bool,
    pub render: bool,
    pub source_control: bool,
    pub domain_management: bool,
    pub mailchimp: bool,
    pub sendgrid: bool,
    pub mailgun: bool,
    pub openai: bool,
    pub stripe: bool,
    pub telegram: bool,
    pub passed: usize,
    pub total: usize,
}

impl Readiness {
    fn checks(&self) -> [bool; 11] {
        [
            self.railway,
            self.vercel,
            self.render,
            self.source_control,
            self.domain_management,
            self.mailchimp,
            self.sendgrid,
            self.mailgun,
            self.openai,
            self.stripe,
            self.telegram,
        ]
    }

    fn scored(mut self) -> Self {
        let checks = self.checks();
        self.total = checks.len();
        self.passed = checks.iter().filter(|&&c| c).count();
        self
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.passed as f64 / self.total as f64 * 1000.0).round() / 10.0
    }
}
