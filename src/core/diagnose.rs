//! Gateway failure diagnostics with remediation checklists

use miette::Diagnostic;
use thiserror::Error;

use crate::core::gateway::GatewayError;

/// Broad cause of a gateway failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The backend could not be reached at all
    Connectivity,
    /// The backend answered, but not in the expected shape or version
    Protocol,
    Generic,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Connectivity => write!(f, "connectivity"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Generic => write!(f, "generic"),
        }
    }
}

impl ErrorCategory {
    /// Category for a structured envelope code
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "network" | "connectivity" => ErrorCategory::Connectivity,
            "protocol" | "version" => ErrorCategory::Protocol,
            _ => ErrorCategory::Generic,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorCategory::Connectivity => "Could not connect to the backend",
            ErrorCategory::Protocol => "Unexpected response from the backend",
            ErrorCategory::Generic => "Unexpected API error",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            ErrorCategory::Connectivity => {
                "The application could not talk to the backend web app. \
                 This usually has one of the causes below."
            }
            ErrorCategory::Protocol => {
                "The backend looks outdated or returned something unexpected. This happens \
                 when the application gains functions the deployed script does not know."
            }
            ErrorCategory::Generic => "Something went wrong while talking to the API.",
        }
    }

    /// Ordered troubleshooting steps
    pub fn remediation(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::Connectivity => &[
                "Check the URL is reachable: `backend_url` must hold the exact deployment URL. \
                 Open it in a browser: a \"Script function not found: doGet\" page means it is \
                 online, a login or permission page means access is misconfigured.",
                "Check access permissions: the deployment's \"Who has access\" option must be \
                 set to \"Anyone\". This is the most common cause.",
                "Check your internet connection.",
            ],
            ErrorCategory::Protocol => &[
                "Update the backend code: copy the complete backend script into Code.gs.",
                "Replace the old code: paste it over the entire existing content.",
                "Create a new deployment version: Deploy > Manage deployments, edit the \
                 active deployment and select \"New version\" before deploying again.",
            ],
            ErrorCategory::Generic => &[
                "Check the backend code is an exact copy of the published script; an outdated \
                 script can cause unexpected errors.",
                "Run the same checks as for connection and unexpected-response errors.",
            ],
        }
    }
}

/// A classified gateway failure
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("{title}: {detail}")]
#[diagnostic(code(idf::gateway))]
pub struct Diagnosis {
    pub category: ErrorCategory,
    pub title: String,
    /// Raw failure message, verbatim
    pub detail: String,
    pub remediation: Vec<String>,
    #[help]
    help: String,
}

impl Diagnosis {
    pub fn new(category: ErrorCategory, detail: impl Into<String>) -> Self {
        let remediation: Vec<String> = category
            .remediation()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let help = std::iter::once(category.summary().to_string())
            .chain(
                remediation
                    .iter()
                    .enumerate()
                    .map(|(i, step)| format!("{}. {}", i + 1, step)),
            )
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            category,
            title: category.title().to_string(),
            detail: detail.into(),
            remediation,
            help,
        }
    }

    pub fn summary(&self) -> &'static str {
        self.category.summary()
    }
}

/// Classify a gateway error: typed variants and structured codes first,
/// message heuristics for everything else
pub fn classify(error: &GatewayError) -> Diagnosis {
    let message = error.to_string();
    let category = match error {
        GatewayError::Transport(_) => ErrorCategory::Connectivity,
        GatewayError::Protocol(_) => ErrorCategory::Protocol,
        GatewayError::Business {
            code: Some(code), ..
        } => ErrorCategory::from_code(code),
        _ => categorize_message(&message),
    };
    Diagnosis::new(category, message)
}

/// Classify a bare failure message
pub fn classify_message(message: &str) -> Diagnosis {
    Diagnosis::new(categorize_message(message), message)
}

const CONNECTIVITY_SIGNATURES: &[&str] = &[
    "connection refused",
    "connection reset",
    "dns error",
    "no route to host",
    "timed out",
    "error sending request",
];

const PROTOCOL_SIGNATURES: &[&str] = &["unexpected token", "unknown action", "error decoding"];

fn categorize_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if message.contains("Failed to fetch")
        || message.contains("NetworkError")
        || CONNECTIVITY_SIGNATURES.iter().any(|s| lower.contains(s))
    {
        return ErrorCategory::Connectivity;
    }

    if message.contains("JSON")
        || message.contains("Ação desconhecida")
        || PROTOCOL_SIGNATURES.iter().any(|s| lower.contains(s))
    {
        return ErrorCategory::Protocol;
    }

    ErrorCategory::Generic
}
