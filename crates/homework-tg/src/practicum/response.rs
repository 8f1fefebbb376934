use super::PracticumError;
use crate::{err, Result};
use serde_json::{Map, Value};

/// Poll response that passed [`check_response`]. The payload is kept as is.
#[derive(Debug, Clone)]
pub(crate) struct CheckedResponse {
    raw: Map<String, Value>,
}

impl CheckedResponse {
    /// Homework records ordered from the newest to the oldest
    pub(crate) fn homeworks(&self) -> &[Value] {
        self.raw
            .get("homeworks")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Server time of the response. It should be used as `from_date`
    /// for the next poll.
    pub(crate) fn current_date(&self) -> Option<i64> {
        self.raw.get("current_date").and_then(Value::as_i64)
    }
}

/// Validates the shape of the poll response. The checks go in order and
/// the first failed one determines the error.
pub(crate) fn check_response(response: Value) -> Result<CheckedResponse> {
    let raw = match response {
        Value::Object(raw) => raw,
        actual => return Err(err!(PracticumError::ResponseNotAnObject { actual })),
    };

    match raw.get("homeworks") {
        Some(Value::Array(_)) => {}
        Some(actual) => {
            return Err(err!(PracticumError::HomeworksNotAList {
                actual: actual.clone()
            }))
        }
        None => return Err(err!(PracticumError::MissingHomeworksKey)),
    }

    Ok(CheckedResponse { raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use expect_test::{expect, Expect};
    use serde_json::json;

    #[track_caller]
    fn assert_rejected(response: Value, expected: Expect) {
        let err = check_response(response).unwrap_err();
        expected.assert_eq(&err.kind().to_string());
    }

    #[test]
    fn valid_response_is_passed_through() {
        let response = check_response(json!({
            "homeworks": [
                { "homework_name": "proj2", "status": "reviewing" },
                { "homework_name": "proj1", "status": "approved" },
            ],
            "current_date": 1_700_000_000,
        }))
        .unwrap();

        assert_eq!(response.homeworks().len(), 2);
        assert_eq!(response.homeworks()[0]["homework_name"], "proj2");
        assert_eq!(response.current_date(), Some(1_700_000_000));
    }

    #[test]
    fn empty_homeworks_and_no_date() {
        let response = check_response(json!({ "homeworks": [] })).unwrap();

        assert!(response.homeworks().is_empty());
        assert_eq!(response.current_date(), None);
    }

    #[test]
    fn not_an_object() {
        assert_rejected(
            json!([{ "homeworks": [] }]),
            expect![[r#"Response is not a JSON object, got: [{"homeworks":[]}]"#]],
        );
        assert_rejected(
            json!(null),
            expect!["Response is not a JSON object, got: null"],
        );
    }

    #[test]
    fn missing_homeworks_key() {
        assert_rejected(
            json!({ "current_date": 1 }),
            expect!["Response object has no `homeworks` key"],
        );
    }

    #[test]
    fn homeworks_not_a_list() {
        assert_rejected(
            json!({ "homeworks": { "homework_name": "proj1" } }),
            expect![[r#"`homeworks` is not a list, got: {"homework_name":"proj1"}"#]],
        );
    }

    #[test]
    fn checks_go_in_order() {
        let err = check_response(json!("homeworks")).unwrap_err();
        assert_matches!(
            err.kind(),
            ErrorKind::Practicum {
                source: PracticumError::ResponseNotAnObject { .. }
            }
        );

        let err = check_response(json!({ "homework": [] })).unwrap_err();
        assert_matches!(
            err.kind(),
            ErrorKind::Practicum {
                source: PracticumError::MissingHomeworksKey
            }
        );
    }
}
