//! Election eligibility keyed on the CAS category attribute.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{UserIdentity, UserInfo};
use crate::session::{stored_attributes, SessionStore};

/// Number of categories offered, starting from the current year.
const CATEGORY_SPAN: i32 = 5;

/// Restricts participation to users of one category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityConstraint {
    pub year: String,
}

impl fmt::Display for EligibilityConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Members of the Class of {}", self.year)
    }
}

/// A selectable eligibility category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Whether `user` belongs to the constraint's category. Users without a
/// category are never eligible.
pub fn constraint_satisfied(constraint: &EligibilityConstraint, user: &UserIdentity) -> bool {
    user.info
        .category
        .as_deref()
        .is_some_and(|category| category == constraint.year)
}

/// Constraint for `category_id`. The constraint does not depend on who
/// creates it.
pub fn build_constraint(category_id: &str, _user: Option<&UserIdentity>) -> EligibilityConstraint {
    EligibilityConstraint {
        year: category_id.to_string(),
    }
}

/// Categories for the current calendar year and the four following ones.
pub fn list_categories(_user: Option<&UserIdentity>) -> Vec<Category> {
    list_categories_from(Local::now().year())
}

/// Categories for `year` through `year + 4`, ascending.
pub fn list_categories_from(year: i32) -> Vec<Category> {
    (year..year + CATEGORY_SPAN)
        .map(|y| Category {
            id: y.to_string(),
            name: format!("Class of {}", y),
        })
        .collect()
}

pub fn constraint_category_id(constraint: &EligibilityConstraint) -> &str {
    &constraint.year
}

pub fn describe_constraint(constraint: &EligibilityConstraint) -> String {
    constraint.to_string()
}

/// Any authenticated user may create an election.
pub fn can_create_election(_user_id: &str, _user_info: Option<&UserInfo>) -> bool {
    true
}

/// Category of the user whose CAS attributes were stored in `session`.
pub fn user_category_from_session<S: SessionStore + ?Sized>(
    session: &S,
    category_attribute: &str,
) -> Option<String> {
    stored_attributes(session)?
        .get_single(category_attribute)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::CasAttributes;
    use crate::identity::CAS_USER_TYPE;
    use crate::session::{store_attributes, MemorySession};

    fn user(category: Option<&str>) -> UserIdentity {
        UserIdentity {
            user_id: "alice".to_string(),
            name: "Alice A".to_string(),
            info: UserInfo {
                name: Some("Alice A".to_string()),
                category: category.map(str::to_string),
            },
            token: None,
            user_type: CAS_USER_TYPE.to_string(),
        }
    }

    #[test]
    fn test_constraint_satisfied() {
        let constraint = build_constraint("2026", None);
        assert!(constraint_satisfied(&constraint, &user(Some("2026"))));
        assert!(!constraint_satisfied(&constraint, &user(Some("2025"))));
        assert!(!constraint_satisfied(&constraint, &user(None)));
    }

    #[test]
    fn test_build_constraint_ignores_user() {
        let owner = user(Some("2025"));
        assert_eq!(
            build_constraint("2030", Some(&owner)),
            build_constraint("2030", None)
        );
        assert_eq!(
            serde_json::to_value(build_constraint("2030", None)).unwrap(),
            serde_json::json!({"year": "2030"})
        );
    }

    #[test]
    fn test_list_categories_from() {
        let categories = list_categories_from(2030);
        let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2030", "2031", "2032", "2033", "2034"]);
        assert_eq!(categories[0].name, "Class of 2030");
        assert_eq!(categories[4].name, "Class of 2034");
    }

    #[test]
    fn test_list_categories_starts_this_year() {
        let categories = list_categories(None);
        assert_eq!(categories.len(), 5);
        assert_eq!(categories[0].id, Local::now().year().to_string());
    }

    #[test]
    fn test_constraint_accessors() {
        let constraint = build_constraint("2027", None);
        assert_eq!(constraint_category_id(&constraint), "2027");
        assert_eq!(describe_constraint(&constraint), "Members of the Class of 2027");
    }

    #[test]
    fn test_anyone_can_create_elections() {
        assert!(can_create_election("alice", Some(&UserInfo::with_category("2026"))));
        assert!(can_create_election("", Some(&UserInfo::default())));
        assert!(can_create_election("", None));
    }

    #[test]
    fn test_category_from_session() {
        let mut session = MemorySession::new();
        assert_eq!(user_category_from_session(&session, "tipoAcessoLogin"), None);

        let mut attrs = CasAttributes::new();
        attrs.insert("tipoAcessoLogin", "2028");
        store_attributes(&mut session, &attrs).unwrap();

        assert_eq!(
            user_category_from_session(&session, "tipoAcessoLogin").as_deref(),
            Some("2028")
        );
    }
}
