//! Message texts sent by the portal

use portal_common::{Role, Secret};

use super::Notification;
use crate::models::Complaint;

/// Builds notifications with links rooted at the frontend base URL
#[derive(Debug, Clone)]
pub struct Messages {
    frontend_url: String,
}

impl Messages {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    /// Welcome for a bulk-provisioned account, carrying its temporary password
    pub fn account_created(
        &self,
        role: Role,
        username: &str,
        temporary_password: &Secret,
        email: &str,
    ) -> Notification {
        let body = format!(
            "Welcome! Your {} account is created.\n\
             Username: {}\n\
             Temporary Password: {}\n\
             Change it after login at {}/change-password",
            role.label().to_lowercase(),
            username,
            temporary_password.expose(),
            self.frontend_url
        );
        Notification::new(format!("Your {} Account", role.label()), body, email)
    }

    /// Welcome for a self-registered account
    pub fn registered(&self, email: &str) -> Notification {
        Notification::new(
            "Welcome to Result Portal",
            format!(
                "Welcome! Your account is created. Log in: {}/login",
                self.frontend_url
            ),
            email,
        )
    }

    pub fn results_ready(&self, email: &str) -> Notification {
        Notification::new(
            "Results Ready",
            format!("Your results are ready! Log in: {}/login", self.frontend_url),
            email,
        )
    }

    pub fn password_reset(&self, email: &str, token: &Secret) -> Notification {
        Notification::new(
            "Password Reset Request",
            format!(
                "Click to reset your password: {}/reset?token={}",
                self.frontend_url,
                token.expose()
            ),
            email,
        )
    }

    pub fn complaint_filed(&self, teachers_address: &str, complaint: &Complaint) -> Notification {
        Notification::new(
            "New Student Complaint",
            format!(
                "New complaint from {} about {}",
                complaint.student, complaint.subject
            ),
            teachers_address,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_created_text() {
        let messages = Messages::new("https://portal.example.edu/");
        let n = messages.account_created(
            Role::Staff,
            "mr_smith",
            &Secret::new("s3cr3t-temp"),
            "smith@x.com",
        );

        assert_eq!(n.subject, "Your Staff Account");
        assert_eq!(n.recipient, "smith@x.com");
        assert!(n.body.starts_with("Welcome! Your staff account is created."));
        assert!(n.body.contains("Username: mr_smith"));
        assert!(n.body.contains("Temporary Password: s3cr3t-temp"));
        assert!(n
            .body
            .ends_with("Change it after login at https://portal.example.edu/change-password"));
    }

    #[test]
    fn test_reset_link() {
        let messages = Messages::new("https://yourdomain.com");
        let n = messages.password_reset("a@x.com", &Secret::new("abc"));
        assert_eq!(n.subject, "Password Reset Request");
        assert_eq!(
            n.body,
            "Click to reset your password: https://yourdomain.com/reset?token=abc"
        );
    }

    #[test]
    fn test_complaint_filed() {
        let messages = Messages::new("https://yourdomain.com");
        let complaint = Complaint::new("alice", "Math grade", "Please re-check");
        let n = messages.complaint_filed("teachers", &complaint);
        assert_eq!(n.recipient, "teachers");
        assert_eq!(n.body, "New complaint from alice about Math grade");
    }
}
