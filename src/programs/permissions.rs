use crate::auth::AuthUser;
use crate::courses::CourseKey;

/// Whether `user` may edit the settings of `course_key` in Studio.
///
/// Global administrators always can; otherwise the caller needs a course-level
/// staff/instructor role or the org-level equivalent.
pub fn has_studio_write_access(user: &AuthUser, course_key: &CourseKey) -> bool {
    if user.administrator {
        return true;
    }

    let course = course_key.to_string();
    let org = course_key.org();

    user.has_role(&format!("staff:{}", course))
        || user.has_role(&format!("instructor:{}", course))
        || user.has_role(&format!("org_staff:{}", org))
        || user.has_role(&format!("org_instructor:{}", org))
}

/// Role that lets a caller look up programs on behalf of other learners
pub const PROGRAMS_LOOKUP_ROLE: &str = "programs_lookup";

/// Whether `user` may list programs for a learner picked by national id
pub fn has_program_lookup_access(user: &AuthUser) -> bool {
    user.administrator || user.has_role(PROGRAMS_LOOKUP_ROLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMethod;

    fn user(administrator: bool, roles: &[&str]) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            administrator,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            method: AuthMethod::Jwt,
        }
    }

    #[test]
    fn grants_by_role_scope() {
        let key = CourseKey::parse("course-v1:edX+DemoX+Demo_Course").unwrap();

        assert!(has_studio_write_access(&user(true, &[]), &key));
        assert!(has_studio_write_access(&user(false, &["staff:course-v1:edX+DemoX+Demo_Course"]), &key));
        assert!(has_studio_write_access(&user(false, &["instructor:course-v1:edX+DemoX+Demo_Course"]), &key));
        assert!(has_studio_write_access(&user(false, &["org_staff:edX"]), &key));
        assert!(has_studio_write_access(&user(false, &["org_instructor:edX"]), &key));

        assert!(!has_studio_write_access(&user(false, &[]), &key));
        assert!(!has_studio_write_access(&user(false, &["staff:course-v1:edX+Other+Run"]), &key));
        assert!(!has_studio_write_access(&user(false, &["org_staff:MITx"]), &key));
    }

    #[test]
    fn lookup_for_others_needs_admin_or_role() {
        assert!(has_program_lookup_access(&user(true, &[])));
        assert!(has_program_lookup_access(&user(false, &[PROGRAMS_LOOKUP_ROLE])));
        assert!(!has_program_lookup_access(&user(false, &["org_staff:edX"])));
    }
}
