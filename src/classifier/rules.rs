use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{truncate, ClassificationRule, SUBJECT_LIMIT, TITLE_LIMIT};

static RE_GITHUB_PULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([^/]+)/([^/]+)/pull/(\d+)").unwrap());
static RE_GITHUB_ISSUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([^/]+)/([^/]+)/issues/(\d+)").unwrap());
static RE_GITHUB_REPO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/([^/]+)/([^/]+)").unwrap());
static RE_JIRA_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"/browse/([A-Z]+-\d+)").unwrap());

fn host(url: &Url) -> &str {
    url.host_str().unwrap_or_default()
}

/// `domain` itself or any subdomain of it.
fn host_is(url: &Url, domain: &str) -> bool {
    let host = host(url);
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_has(url: &Url, fragment: &str) -> bool {
    url.path().contains(fragment)
}

/// First delimiter-separated segment of the title, if it says something.
fn lead<'a>(title: &'a str, delimiter: &str) -> Option<&'a str> {
    title.split(delimiter).next().filter(|s| !s.is_empty())
}

fn github_slug(re: &Regex, url: &Url) -> Option<(String, String, String)> {
    let caps = re.captures(url.path())?;
    Some((
        caps.get(1)?.as_str().to_string(),
        caps.get(2)?.as_str().to_string(),
        caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule table. Order matters: specific paths before the bare domain.
// ─────────────────────────────────────────────────────────────────────────────

pub static RULES: &[ClassificationRule] = &[
    // Messaging
    ClassificationRule {
        name: "whatsapp",
        matches: |url| host(url) == "web.whatsapp.com",
        describe: |_, title| match title.and_then(|t| lead(t, " - ")) {
            Some(contact) if contact != "WhatsApp" => {
                format!("Chatted with {} on WhatsApp", truncate(contact, TITLE_LIMIT))
            }
            _ => "On WhatsApp".into(),
        },
    },
    ClassificationRule {
        name: "slack",
        matches: |url| host_is(url, "slack.com"),
        describe: |_, title| match title.and_then(|t| lead(t, " | ")) {
            Some(channel) if channel != "Slack" => {
                format!("Chatted in {} on Slack", truncate(channel, TITLE_LIMIT))
            }
            _ => "On Slack".into(),
        },
    },
    ClassificationRule {
        name: "teams",
        matches: |url| host_is(url, "teams.microsoft.com"),
        describe: |_, title| match title.and_then(|t| lead(t, " | ")) {
            Some(context) if !context.contains("Microsoft Teams") => {
                format!("On Teams: {}", truncate(context, TITLE_LIMIT))
            }
            _ => "On Microsoft Teams".into(),
        },
    },
    ClassificationRule {
        name: "discord",
        matches: |url| host_is(url, "discord.com"),
        describe: |_, title| {
            let Some(title) = title else {
                return "On Discord".into();
            };
            // "Server | #channel | Discord" or "@user | Discord"
            let parts: Vec<&str> = title.split(" | ").collect();
            match parts.as_slice() {
                [_, channel, last] if last.contains("Discord") => {
                    format!("Chatted in {} on Discord", truncate(channel, TITLE_LIMIT))
                }
                [first, .., last] if last.contains("Discord") => {
                    format!("Chatted on Discord: {}", truncate(first, TITLE_LIMIT))
                }
                _ => "On Discord".into(),
            }
        },
    },
    ClassificationRule {
        name: "telegram",
        matches: |url| host_is(url, "web.telegram.org"),
        describe: |_, title| {
            let contact = title
                .map(|t| t.replace(" – Telegram", "").replace(" - Telegram", ""))
                .filter(|c| !c.is_empty() && c != "Telegram");
            match contact {
                Some(contact) => {
                    format!("Chatted with {} on Telegram", truncate(&contact, TITLE_LIMIT))
                }
                None => "On Telegram".into(),
            }
        },
    },
    // Email
    ClassificationRule {
        name: "gmail",
        matches: |url| host(url) == "mail.google.com",
        describe: |_, title| {
            let Some(title) = title else {
                return "Checked Gmail".into();
            };
            if title.contains(" - ") && !title.starts_with("Inbox") {
                if let Some(subject) = lead(title, " - ").filter(|s| *s != "Gmail") {
                    return format!("Email: {}", truncate(subject, SUBJECT_LIMIT));
                }
            }
            if title.starts_with("Inbox") {
                "Checked Gmail inbox".into()
            } else if title.contains("Compose") {
                "Composing email in Gmail".into()
            } else {
                "Checked Gmail".into()
            }
        },
    },
    ClassificationRule {
        name: "outlook",
        matches: |url| host_is(url, "outlook.office.com") || host_is(url, "outlook.live.com"),
        describe: |_, title| {
            let subject = title
                .filter(|t| t.contains(" - Outlook"))
                .map(|t| t.replace(" - Outlook", ""))
                .filter(|s| !s.is_empty() && s != "Mail");
            match subject {
                Some(subject) => format!("Email: {}", truncate(&subject, SUBJECT_LIMIT)),
                None => "Checked Outlook".into(),
            }
        },
    },
    // Documents
    ClassificationRule {
        name: "google-docs",
        matches: |url| host(url) == "docs.google.com" && path_has(url, "/document/"),
        describe: |_, title| match title.map(|t| t.replace(" - Google Docs", "")) {
            Some(name) if !name.is_empty() => {
                format!("Edited document: {}", truncate(&name, TITLE_LIMIT))
            }
            _ => "Edited Google Doc".into(),
        },
    },
    ClassificationRule {
        name: "google-sheets",
        matches: |url| host(url) == "docs.google.com" && path_has(url, "/spreadsheets/"),
        describe: |_, title| match title.map(|t| t.replace(" - Google Sheets", "")) {
            Some(name) if !name.is_empty() => {
                format!("Edited spreadsheet: {}", truncate(&name, TITLE_LIMIT))
            }
            _ => "Edited Google Sheet".into(),
        },
    },
    ClassificationRule {
        name: "google-slides",
        matches: |url| host(url) == "docs.google.com" && path_has(url, "/presentation/"),
        describe: |_, title| match title.map(|t| t.replace(" - Google Slides", "")) {
            Some(name) if !name.is_empty() => {
                format!("Edited presentation: {}", truncate(&name, TITLE_LIMIT))
            }
            _ => "Edited Google Slides".into(),
        },
    },
    ClassificationRule {
        name: "notion",
        matches: |url| host_is(url, "notion.so"),
        describe: |_, title| {
            let page = title
                .map(|t| t.replace(" | Notion", "").replace(" - Notion", ""))
                .filter(|p| !p.is_empty() && p != "Notion");
            match page {
                Some(page) => format!("Edited: {} in Notion", truncate(&page, TITLE_LIMIT)),
                None => "Used Notion".into(),
            }
        },
    },
    ClassificationRule {
        name: "confluence",
        matches: |url| host_is(url, "atlassian.net") && path_has(url, "/wiki/"),
        describe: |_, title| match title {
            Some(title) => format!("Viewed Confluence: {}", truncate(title, TITLE_LIMIT)),
            None => "Used Confluence".into(),
        },
    },
    // Code hosting
    ClassificationRule {
        name: "github-pull",
        matches: |url| host(url) == "github.com" && path_has(url, "/pull/"),
        describe: |url, _| match github_slug(&RE_GITHUB_PULL, url) {
            Some((owner, repo, number)) => format!("Reviewed PR #{number} on {owner}/{repo}"),
            None => "Reviewed pull request on GitHub".into(),
        },
    },
    ClassificationRule {
        name: "github-issue",
        matches: |url| host(url) == "github.com" && path_has(url, "/issues/"),
        describe: |url, _| match github_slug(&RE_GITHUB_ISSUE, url) {
            Some((owner, repo, number)) => format!("Viewed issue #{number} on {owner}/{repo}"),
            None => "Viewed issue on GitHub".into(),
        },
    },
    ClassificationRule {
        name: "github-repository",
        matches: |url| host(url) == "github.com",
        describe: |url, _| {
            let Some((owner, repo, _)) = github_slug(&RE_GITHUB_REPO, url) else {
                return "Browsed GitHub".into();
            };
            if path_has(url, "/actions") {
                format!("Viewed CI/CD for {owner}/{repo}")
            } else if path_has(url, "/commits") {
                format!("Viewed commits for {owner}/{repo}")
            } else {
                format!("Browsed {owner}/{repo} on GitHub")
            }
        },
    },
    ClassificationRule {
        name: "gitlab",
        // Self-hosted instances usually keep "gitlab" somewhere in the host.
        matches: |url| host(url).contains("gitlab"),
        describe: |url, _| {
            if path_has(url, "/merge_requests/") {
                "Reviewed merge request on GitLab".into()
            } else if path_has(url, "/issues/") {
                "Viewed issue on GitLab".into()
            } else {
                "Browsed GitLab".into()
            }
        },
    },
    ClassificationRule {
        name: "jira",
        matches: |url| host_is(url, "atlassian.net") && path_has(url, "/browse/"),
        describe: |url, _| match RE_JIRA_KEY.captures(url.path()).and_then(|c| c.get(1)) {
            Some(key) => format!("Viewed Jira ticket {}", key.as_str()),
            None => "Viewed Jira ticket".into(),
        },
    },
    // Design
    ClassificationRule {
        name: "figma",
        matches: |url| host_is(url, "figma.com"),
        describe: |_, title| {
            // "Design Name – Figma"
            let project = title.and_then(|t| lead(t, " – ").or_else(|| lead(t, " - ")));
            match project {
                Some(project) if project != "Figma" => {
                    format!("Designed: {} in Figma", truncate(project, TITLE_LIMIT))
                }
                _ => "Used Figma".into(),
            }
        },
    },
    ClassificationRule {
        name: "canva",
        matches: |url| host_is(url, "canva.com"),
        describe: |_, title| match title {
            Some(_) => "Designed in Canva".into(),
            None => "Used Canva".into(),
        },
    },
    // Video
    ClassificationRule {
        name: "youtube-watch",
        matches: |url| host_is(url, "youtube.com") && url.path() == "/watch",
        describe: |_, title| match title.map(|t| t.replace(" - YouTube", "")) {
            Some(video) if !video.is_empty() => {
                format!("Watched: {}", truncate(&video, SUBJECT_LIMIT))
            }
            _ => "Watched YouTube".into(),
        },
    },
    ClassificationRule {
        name: "youtube",
        matches: |url| host_is(url, "youtube.com"),
        describe: |_, _| "Browsed YouTube".into(),
    },
    // Social
    ClassificationRule {
        name: "linkedin",
        matches: |url| host_is(url, "linkedin.com"),
        describe: |url, _| {
            if path_has(url, "/messaging") {
                "Messaging on LinkedIn".into()
            } else if path_has(url, "/jobs") {
                "Viewing jobs on LinkedIn".into()
            } else if path_has(url, "/in/") {
                "Viewed LinkedIn profile".into()
            } else {
                "Browsed LinkedIn".into()
            }
        },
    },
    ClassificationRule {
        name: "x",
        matches: |url| host_is(url, "twitter.com") || host_is(url, "x.com"),
        describe: |url, _| {
            if path_has(url, "/messages") {
                "Messaging on X".into()
            } else {
                "Browsed X (Twitter)".into()
            }
        },
    },
    // The collector's own dashboard
    ClassificationRule {
        name: "dashboard",
        matches: |url| matches!(host(url), "127.0.0.1" | "localhost"),
        describe: |url, _| {
            let section = [
                ("/profiles", "Managed profiles in the dashboard"),
                ("/review", "Reviewed time entries in the dashboard"),
                ("/rules", "Configured rules in the dashboard"),
                ("/settings", "Changed settings in the dashboard"),
                ("/suggestions", "Reviewed suggestions in the dashboard"),
            ]
            .into_iter()
            .find(|(fragment, _)| path_has(url, fragment));

            match section {
                Some((_, description)) => description.into(),
                None => "Used the dashboard".into(),
            }
        },
    },
];
