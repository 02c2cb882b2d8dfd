use serde::{Deserialize, Serialize};

/// FHIR OperationOutcome resource for error reporting
/// See: https://www.hl7.org/fhir/operationoutcome.html
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    Invariant,
    TooLong,
    CodeInvalid,
    BusinessRule,
    Exception,
    Informational,
}

/// Message fragments and the issue type they indicate, first match wins.
const MESSAGE_TYPES: &[(&str, IssueType)] = &[
    ("date ordering", IssueType::BusinessRule),
    ("is in the future", IssueType::BusinessRule),
    ("is before createdAt", IssueType::BusinessRule),
    ("broken reference", IssueType::Invariant),
    ("must be given", IssueType::Required),
    ("must not be empty", IssueType::Required),
    ("must have a coding or text", IssueType::Required),
    ("is required", IssueType::Required),
    ("missing", IssueType::Required),
    ("not given", IssueType::Required),
    ("Composition", IssueType::Invariant),
    ("duplicate fullUrl", IssueType::Invariant),
    ("character limit", IssueType::TooLong),
    ("not a recognized code", IssueType::CodeInvalid),
    ("coding from", IssueType::CodeInvalid),
    ("does not match the format", IssueType::CodeInvalid),
];

impl IssueType {
    /// Issue type for a `path: text` validation message, or `fallback`.
    pub fn classify(message: &str, fallback: IssueType) -> IssueType {
        MESSAGE_TYPES
            .iter()
            .find(|(fragment, _)| message.contains(fragment))
            .map_or(fallback, |(_, code)| *code)
    }
}

impl OperationOutcomeIssue {
    /// Issue for a `path: text` message; the path becomes the expression.
    pub fn from_message(severity: IssueSeverity, fallback: IssueType, message: &str) -> Self {
        let expression = message
            .split_once(": ")
            .map(|(path, _)| path)
            .filter(|path| !path.is_empty() && !path.contains(' '))
            .map(|path| vec![path.to_string()]);
        Self {
            severity,
            code: IssueType::classify(message, fallback),
            diagnostics: Some(message.to_string()),
            expression,
        }
    }
}

impl OperationOutcome {
    /// Create a new OperationOutcome with a single issue
    pub fn new(severity: IssueSeverity, code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self::from_issues(vec![OperationOutcomeIssue {
            severity,
            code,
            diagnostics: Some(diagnostics.into()),
            expression: None,
        }])
    }

    pub fn from_issues(issue: Vec<OperationOutcomeIssue>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue,
        }
    }

    /// Create a success OperationOutcome (validation passed)
    pub fn success() -> Self {
        Self::new(
            IssueSeverity::Information,
            IssueType::Informational,
            "Validation successful",
        )
    }

    /// Create an error OperationOutcome
    pub fn error(code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, code, diagnostics)
    }

    /// Create a fatal OperationOutcome; the pipeline stopped.
    pub fn fatal(code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Fatal, code, diagnostics)
    }

    /// True when any issue is an error or fatal.
    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|i| matches!(i.severity, IssueSeverity::Error | IssueSeverity::Fatal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_outcome_serialization() {
        let outcome = OperationOutcome::error(IssueType::BusinessRule, "Discharge before admission");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("OperationOutcome"));
        assert!(json.contains("error"));
        assert!(json.contains("business-rule"));
        assert!(!json.contains("expression"));
    }

    #[test]
    fn test_success_helper() {
        let outcome = OperationOutcome::success();
        assert_eq!(outcome.issue.len(), 1);
        assert_eq!(outcome.issue[0].severity, IssueSeverity::Information);
        assert_eq!(outcome.issue[0].code, IssueType::Informational);
        assert!(!outcome.has_errors());
    }

    #[test]
    fn test_issue_from_message() {
        let issue = OperationOutcomeIssue::from_message(
            IssueSeverity::Warning,
            IssueType::Value,
            "header.patient.postalCode: '12-34' is not a valid postal code",
        );
        assert_eq!(
            issue.expression,
            Some(vec!["header.patient.postalCode".to_string()])
        );
        assert_eq!(issue.code, IssueType::Value);

        let issue = OperationOutcomeIssue::from_message(
            IssueSeverity::Error,
            IssueType::Invalid,
            "dischargeSummary.admissionDate: date ordering violated, admission 2024-03-10 must be before discharge 2024-03-01",
        );
        assert_eq!(issue.code, IssueType::BusinessRule);

        let issue = OperationOutcomeIssue::from_message(
            IssueSeverity::Error,
            IssueType::Invalid,
            "Input rejected for unknown reasons",
        );
        assert!(issue.expression.is_none());
        assert_eq!(issue.code, IssueType::Invalid);
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(
            IssueType::classify("checkup.overallAssessment: must be given", IssueType::Invalid),
            IssueType::Required
        );
        assert_eq!(
            IssueType::classify(
                "referral.reason: narrative is 1200 characters, over the 1000 character limit for Latin text",
                IssueType::Value
            ),
            IssueType::TooLong
        );
        assert_eq!(
            IssueType::classify(
                "Bundle.entry[3].resource.subject.reference: broken reference 'urn:uuid:x'",
                IssueType::Invalid
            ),
            IssueType::Invariant
        );
    }

    #[test]
    fn test_fatal_has_errors() {
        assert!(OperationOutcome::fatal(IssueType::Exception, "boom").has_errors());
    }
}
