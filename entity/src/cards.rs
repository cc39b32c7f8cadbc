//! Inbound employee cards: the full shape accepted on creation and the
//! partial shape accepted on update.

use chrono::{Datelike, Utc};
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::employees;

/// Births on or before this year are rejected.
pub const MIN_YEAR_OF_BIRTH_EXCLUSIVE: i32 = 1900;

/// A field that failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct InvalidField {
    pub field: &'static str,
    pub message: String,
}

/// Year of the wall-clock UTC date; the upper bound for `year_of_birth`.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// `year` must lie strictly between 1900 and `current_year`.
pub fn validate_year_of_birth(year: i32, current_year: i32) -> Result<i32, InvalidField> {
    if year <= MIN_YEAR_OF_BIRTH_EXCLUSIVE || year >= current_year {
        return Err(InvalidField {
            field: "year_of_birth",
            message: format!(
                "year of birth must be after {MIN_YEAR_OF_BIRTH_EXCLUSIVE} and before {current_year}, got {year}"
            ),
        });
    }
    Ok(year)
}

/// Complete employee card, every business field required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmployeeCard {
    pub surname: String,
    pub name: String,
    pub patronymic: String,
    pub year_of_birth: i32,
    pub personnel_number: i32,
    pub salary: f64,
    pub position: String,
    pub legal_entity: String,
    pub structural_subdivision: String,
}

impl EmployeeCard {
    pub fn validate(&self) -> Result<(), InvalidField> {
        self.validate_at(current_year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), InvalidField> {
        validate_year_of_birth(self.year_of_birth, current_year).map(|_| ())
    }

    /// Insertable row; `id` is left for the store to assign.
    pub fn into_active_model(self) -> employees::ActiveModel {
        employees::ActiveModel {
            surname: Set(self.surname),
            name: Set(self.name),
            patronymic: Set(self.patronymic),
            year_of_birth: Set(self.year_of_birth),
            personnel_number: Set(self.personnel_number),
            salary: Set(self.salary),
            position: Set(self.position),
            legal_entity: Set(self.legal_entity),
            structural_subdivision: Set(self.structural_subdivision),
            ..Default::default()
        }
    }
}

/// Partial employee card. Absent and `null` fields are left untouched.
///
/// Serializing a patch yields only the supplied fields, which is what the
/// update endpoint echoes back as `updated_fields`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeCardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_birth: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personnel_number: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural_subdivision: Option<String>,
}

impl EmployeeCardPatch {
    pub fn validate(&self) -> Result<(), InvalidField> {
        self.validate_at(current_year())
    }

    pub fn validate_at(&self, current_year: i32) -> Result<(), InvalidField> {
        match self.year_of_birth {
            Some(year) => validate_year_of_birth(year, current_year).map(|_| ()),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every supplied field onto `active`, leaving the rest as loaded.
    pub fn apply(&self, active: &mut employees::ActiveModel) {
        if let Some(surname) = &self.surname {
            active.surname = Set(surname.clone());
        }
        if let Some(name) = &self.name {
            active.name = Set(name.clone());
        }
        if let Some(patronymic) = &self.patronymic {
            active.patronymic = Set(patronymic.clone());
        }
        if let Some(year) = self.year_of_birth {
            active.year_of_birth = Set(year);
        }
        if let Some(number) = self.personnel_number {
            active.personnel_number = Set(number);
        }
        if let Some(salary) = self.salary {
            active.salary = Set(salary);
        }
        if let Some(position) = &self.position {
            active.position = Set(position.clone());
        }
        if let Some(legal_entity) = &self.legal_entity {
            active.legal_entity = Set(legal_entity.clone());
        }
        if let Some(subdivision) = &self.structural_subdivision {
            active.structural_subdivision = Set(subdivision.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveValue;
    use serde_json::json;

    fn card(year_of_birth: i32) -> EmployeeCard {
        EmployeeCard {
            surname: "Ivanov".into(),
            name: "Ivan".into(),
            patronymic: "Ivanovich".into(),
            year_of_birth,
            personnel_number: 42,
            salary: 1200.5,
            position: "Engineer".into(),
            legal_entity: "Acme LLC".into(),
            structural_subdivision: "R&D".into(),
        }
    }

    #[test]
    fn year_bounds_are_exclusive() {
        assert!(validate_year_of_birth(1900, 2026).is_err());
        assert!(validate_year_of_birth(2026, 2026).is_err());
        assert!(validate_year_of_birth(2027, 2026).is_err());
        assert_eq!(validate_year_of_birth(1901, 2026), Ok(1901));
        assert_eq!(validate_year_of_birth(2025, 2026), Ok(2025));
    }

    #[test]
    fn full_card_checks_against_wall_clock() {
        let now = current_year();
        assert!(card(1900).validate().is_err());
        assert!(card(now).validate().is_err());
        assert!(card(1901).validate().is_ok());
        assert!(card(now - 1).validate().is_ok());
    }

    #[test]
    fn patch_only_checks_year_when_present() {
        let now = current_year();
        assert!(EmployeeCardPatch::default().validate().is_ok());
        let patch = EmployeeCardPatch {
            year_of_birth: Some(now),
            ..Default::default()
        };
        let err = patch.validate().unwrap_err();
        assert_eq!(err.field, "year_of_birth");
        let patch = EmployeeCardPatch {
            year_of_birth: Some(1985),
            ..Default::default()
        };
        assert!(patch.validate_at(now).is_ok());
    }

    #[test]
    fn full_card_rejects_missing_fields() {
        let body = json!({
            "surname": "Ivanov",
            "name": "Ivan",
            "patronymic": "Ivanovich",
            "year_of_birth": 1980,
            "salary": 10.0,
            "position": "Engineer",
            "legal_entity": "Acme LLC",
            "structural_subdivision": "R&D"
        });
        assert!(serde_json::from_value::<EmployeeCard>(body).is_err());
    }

    #[test]
    fn patch_treats_null_as_absent_and_echoes_supplied_fields() {
        let patch: EmployeeCardPatch =
            serde_json::from_value(json!({"salary": 5000.0, "position": null})).unwrap();
        assert_eq!(patch.salary, Some(5000.0));
        assert_eq!(patch.position, None);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"salary": 5000.0}));
        assert!(!patch.is_empty());
        assert!(serde_json::from_value::<EmployeeCardPatch>(json!({})).unwrap().is_empty());
    }

    #[test]
    fn apply_touches_only_supplied_columns() {
        let mut active = employees::ActiveModel::default();
        EmployeeCardPatch {
            salary: Some(5000.0),
            ..Default::default()
        }
        .apply(&mut active);
        assert_eq!(active.salary, ActiveValue::Set(5000.0));
        assert!(active.year_of_birth.is_not_set());
        assert!(active.surname.is_not_set());
    }
}
