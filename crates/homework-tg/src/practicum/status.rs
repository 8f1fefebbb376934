use super::PracticumError;
use crate::{err, Result};
use serde_json::Value;

/// Review status of a homework, as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub(crate) fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// Formats the status change notification for a single homework record.
pub(crate) fn parse_status(homework: &Value) -> Result<String> {
    let name = homework
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            err!(PracticumError::MissingHomeworkName {
                homework: homework.clone()
            })
        })?;

    let status = homework.get("status").and_then(Value::as_str);

    // A missing status is reported the same way as an unknown one
    let status = status
        .and_then(|status| status.parse::<HomeworkStatus>().ok())
        .ok_or_else(|| {
            err!(PracticumError::UnknownStatus {
                status: status.map(str::to_owned)
            })
        })?;

    Ok(status_changed_message(name, status))
}

fn status_changed_message(name: &str, status: HomeworkStatus) -> String {
    format!(
        "Изменился статус проверки работы \"{name}\".{}",
        status.verdict()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use expect_test::expect;
    use serde_json::json;

    #[test]
    fn every_known_status_has_a_verdict() {
        let statuses = [
            HomeworkStatus::Approved,
            HomeworkStatus::Reviewing,
            HomeworkStatus::Rejected,
        ];

        let messages: Vec<_> = statuses
            .into_iter()
            .map(|status| {
                let code: &'static str = status.into();
                let homework = json!({ "homework_name": "proj1", "status": code });
                let message = parse_status(&homework).unwrap();

                assert!(message.contains("proj1"));
                assert!(message.ends_with(status.verdict()));

                message
            })
            .collect();

        expect![[r#"
            [
                "Изменился статус проверки работы \"proj1\".Работа проверена: ревьюеру всё понравилось. Ура!",
                "Изменился статус проверки работы \"proj1\".Работа взята на проверку ревьюером.",
                "Изменился статус проверки работы \"proj1\".Работа проверена: у ревьюера есть замечания.",
            ]
        "#]]
        .assert_debug_eq(&messages);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let homework = json!({
            "id": 124,
            "status": "rejected",
            "homework_name": "username__hw_python_oop.zip",
            "reviewer_comment": "Код не по PEP8, нужно исправить",
            "date_updated": "2020-02-13T16:42:47Z",
            "lesson_name": "Итоговый проект"
        });

        expect![[r#"Изменился статус проверки работы "username__hw_python_oop.zip".Работа проверена: у ревьюера есть замечания."#]]
            .assert_eq(&parse_status(&homework).unwrap());
    }

    #[test]
    fn unknown_status() {
        let homework = json!({ "homework_name": "proj1", "status": "lost" });
        let err = parse_status(&homework).unwrap_err();

        assert_matches!(
            err.kind(),
            ErrorKind::Practicum {
                source: PracticumError::UnknownStatus { status: Some(status) }
            } if status == "lost"
        );
        expect![[r#"Unknown homework status: Some("lost")"#]].assert_eq(&err.kind().to_string());
    }

    #[test]
    fn missing_status_is_unknown() {
        let homework = json!({ "homework_name": "proj1" });
        let err = parse_status(&homework).unwrap_err();

        assert_matches!(
            err.kind(),
            ErrorKind::Practicum {
                source: PracticumError::UnknownStatus { status: None }
            }
        );
    }

    #[test]
    fn status_codes_are_case_sensitive() {
        let homework = json!({ "homework_name": "proj1", "status": "Approved" });

        assert_matches!(
            parse_status(&homework).unwrap_err().kind(),
            ErrorKind::Practicum {
                source: PracticumError::UnknownStatus { .. }
            }
        );
    }

    #[test]
    fn missing_name() {
        for homework in [
            json!({ "status": "approved" }),
            json!({ "homework_name": 42, "status": "approved" }),
            json!("approved"),
        ] {
            let err = parse_status(&homework).unwrap_err();
            assert_matches!(
                err.kind(),
                ErrorKind::Practicum {
                    source: PracticumError::MissingHomeworkName { .. }
                }
            );
        }
    }
}
