/// Base URL of every external collaborator. Production values by default;
/// tests point individual entries at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub repo_host: String,
    pub render: String,
    pub railway: String,
    pub vercel: String,
    pub godaddy: String,
    pub mailchimp: String,
    pub sendgrid: String,
    pub mailgun: String,
    pub datadog: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            repo_host: "https://api.github.com".into(),
            render: "https://api.render.com/v1".into(),
            railway: "https://backboard.railway.app/graphql".into(),
            vercel: "https://api.vercel.com/v2".into(),
            godaddy: "https://api.godaddy.com/v1".into(),
            mailchimp: "https://us1.api.mailchimp.com/3.0".into(),
            sendgrid: "https://api.sendgrid.com/v3".into(),
            mailgun: "https://api.mailgun.net/v3".into(),
            datadog: "https://api.datadoghq.com/api/v1".into(),
        }
    }
}

impl Endpoints {
    /// Point every collaborator at one base URL. Test helper for mock servers.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            repo_host: base.to_string(),
            render: base.to_string(),
            railway: format!("{base}/graphql"),
            vercel: base.to_string(),
            godaddy: base.to_string(),
            mailchimp: base.to_string(),
            sendgrid: base.to_string(),
            mailgun: base.to_string(),
            datadog: base.to_string(),
        }
    }

    /// Mailchimp's API host is derived from the server prefix of the key.
    pub fn mailchimp_for_server(server: &str) -> String {
        format!("https://{server}.api.mailchimp.com/3.0")
    }
}
