//! Simulation scenarios: which lure page is shown, where it posts, and what
//! the debrief teaches afterwards.

/// Social platforms with a dedicated lookalike login page.
const KNOWN_PLATFORMS: [&str; 3] = ["facebook", "instagram", "linkedin"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    /// Generic credential-harvesting login page.
    Login,
    /// Cloned social media login.
    Social { platform: String },
    /// "Your account will be locked" pressure page.
    Urgent,
    /// Personalised lure addressed to a named target.
    Spear { target: String, employee_id: String },
}

impl Scenario {
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Login => "login",
            Scenario::Social { .. } => "social-media",
            Scenario::Urgent => "urgency-attack",
            Scenario::Spear { .. } => "spear-phishing",
        }
    }

    /// Lure page shown to the trainee. Unknown platforms get the generic login page.
    pub fn page(&self) -> &'static str {
        match self {
            Scenario::Login => "login",
            Scenario::Social { platform } => match platform.as_str() {
                "facebook" => "facebook_login",
                "instagram" => "instagram_login",
                "linkedin" => "linkedin_login",
                _ => "login",
            },
            Scenario::Urgent => "urgent_security",
            Scenario::Spear { .. } => "spear_phishing",
        }
    }

    /// Where the lure page is served; invalid submissions are sent back here.
    pub fn simulation_path(&self) -> String {
        match self {
            Scenario::Login => "/simulation".to_string(),
            Scenario::Social { platform } => format!("/simulation/social-media/{}", platform),
            Scenario::Urgent => "/simulation/urgency-attack".to_string(),
            Scenario::Spear { target, .. } => format!("/simulation/spear-phishing/{}", target),
        }
    }

    pub fn capture_path(&self) -> &'static str {
        match self {
            Scenario::Login => "/capture",
            Scenario::Social { .. } => "/capture-social",
            Scenario::Urgent => "/capture-urgent",
            Scenario::Spear { .. } => "/capture-spear",
        }
    }

    pub fn is_known_platform(platform: &str) -> bool {
        KNOWN_PLATFORMS.contains(&platform)
    }

    pub fn headline(&self) -> String {
        match self {
            Scenario::Login => "This was a phishing simulation.".to_string(),
            Scenario::Social { platform } => {
                format!("That {} login page was a phishing simulation.", platform)
            }
            Scenario::Urgent => "The urgent security warning was a phishing simulation.".to_string(),
            Scenario::Spear { target, .. } => {
                format!("This message was tailored to you as '{}' and was a phishing simulation.", target)
            }
        }
    }

    pub fn red_flags(&self) -> Vec<&'static str> {
        let mut flags = vec![
            "The page asked for your password after you followed a link.",
            "The address bar did not show the real service's domain.",
        ];
        match self {
            Scenario::Login => {
                flags.push("The login page had no connection to anything you were doing.");
            }
            Scenario::Social { .. } => {
                flags.push("Social networks never ask you to log in again from a message link.");
                flags.push("Lookalike pages copy logos and layout; check the URL, not the design.");
            }
            Scenario::Urgent => {
                flags.push("Threats of immediate account suspension are meant to rush you.");
                flags.push("Real security teams do not ask for your password to 'verify' you.");
            }
            Scenario::Spear { .. } => {
                flags.push("Using your name, role, or employee ID does not make a request legitimate.");
                flags.push("Verify unexpected requests through a channel you already trust.");
            }
        }
        flags
    }
}
