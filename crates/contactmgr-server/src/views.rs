//! HTML pages.
//!
//! Pages are small enough to be built with `format!`. Every value that
//! comes from the user or the remote service goes through [`html_escape`].

use std::fmt::Write;

use contactmgr_core::ContactRecord;
use contactmgr_core::edit::{fields, new_fields};
use contactmgr_providers::google::UserInfo;

use crate::method_override::METHOD_PARAM;
use crate::session::Flash;

/// Message shown when the contact list cannot be loaded from the remote
/// service.
pub const LIST_FAILED: &str =
    "Failed to retrieve contacts. Ensure you have contacts in your Google account.";

/// Message shown when the remote service cannot be reached.
pub const UNAVAILABLE: &str = "Service temporarily unavailable";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
table{border-collapse:collapse;width:100%}td,th{padding:.4rem;border-bottom:1px solid #ddd;text-align:left}\
.flash-success{color:#155724;background:#d4edda;padding:.5rem}\
.flash-error{color:#721c24;background:#f8d7da;padding:.5rem}\
label{display:block;margin:.5rem 0}form.inline{display:inline}";

/// Escapes text for use in HTML content and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - Contact Manager</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape(title),
        STYLE,
        body
    )
}

fn flash_html(flash: Option<&Flash>) -> String {
    match flash {
        Some(Flash::Success(message)) => {
            format!("<p class=\"flash-success\">{}</p>", html_escape(message))
        }
        Some(Flash::Error(message)) => {
            format!("<p class=\"flash-error\">{}</p>", html_escape(message))
        }
        None => String::new(),
    }
}

fn logout_form() -> &'static str {
    "<form class=\"inline\" method=\"post\" action=\"/logout\"><button type=\"submit\">Sign out</button></form>"
}

/// Landing page.
pub fn index_page(user: Option<&UserInfo>) -> String {
    let body = match user {
        Some(user) => format!(
            "<h1>Contact Manager</h1>\n<p>Signed in as {}.</p>\n\
             <p><a href=\"/contacts\">Your contacts</a> {}</p>",
            html_escape(user.display_name()),
            logout_form()
        ),
        None => "<h1>Contact Manager</h1>\n\
                 <p>Manage your Google contacts.</p>\n\
                 <p><a href=\"/contacts/login\">Sign in</a></p>"
            .to_string(),
    };
    layout("Home", &body)
}

/// Login page. `failed` is set after an unsuccessful sign-in.
pub fn login_page(failed: bool) -> String {
    let error = if failed {
        "<p class=\"flash-error\">Sign-in failed. Please try again.</p>\n"
    } else {
        ""
    };
    let body = format!(
        "<h1>Sign in</h1>\n{error}<p><a href=\"/oauth2/authorization/google\">Sign in with Google</a></p>"
    );
    layout("Sign in", &body)
}

/// Generic error page.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p class=\"flash-error\">{}</p>\n\
         <p><a href=\"/contacts\">Back to contacts</a> | <a href=\"/\">Home</a></p>",
        html_escape(message)
    );
    layout("Error", &body)
}

/// The contact list.
pub fn contacts_page(user: &UserInfo, contacts: &[ContactRecord], flash: Option<&Flash>) -> String {
    let mut body = String::new();

    body.push_str("<header>");
    if let Some(picture) = user.picture.as_deref() {
        let _ = write!(
            body,
            "<img src=\"{}\" alt=\"\" width=\"32\" height=\"32\"> ",
            html_escape(picture)
        );
    }
    let _ = write!(
        body,
        "<strong>{}</strong> {}</header>\n",
        html_escape(user.display_name()),
        logout_form()
    );

    body.push_str("<h1>Contacts</h1>\n");
    body.push_str(&flash_html(flash));
    body.push_str("\n<p><a href=\"/contacts/add\">Add contact</a></p>\n");

    if contacts.is_empty() {
        body.push_str("<p>No contacts found.</p>");
        return layout("Contacts", &body);
    }

    body.push_str(
        "<table>\n<tr><th>Name</th><th>Email</th><th>Phone</th><th>Organization</th><th></th></tr>\n",
    );
    for contact in contacts {
        let email = contact.email().and_then(|e| e.value.as_deref());
        let phone = contact.phone().and_then(|p| p.value.as_deref());
        let organization = contact.organization().and_then(|o| o.name.as_deref());
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>\
             <a href=\"/contacts/edit/{}\">Edit</a> \
             <form class=\"inline\" method=\"post\" action=\"/contacts/people/{}\">\
             <input type=\"hidden\" name=\"{METHOD_PARAM}\" value=\"DELETE\">\
             <button type=\"submit\">Delete</button></form></td></tr>",
            html_escape(&contact.display_name()),
            html_escape(email.unwrap_or_default()),
            html_escape(phone.unwrap_or_default()),
            html_escape(organization.unwrap_or_default()),
            html_escape(&contact.resource_name),
            html_escape(contact.person_id()),
        );
    }
    body.push_str("</table>");

    layout("Contacts", &body)
}

fn input(label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        "<label>{label} <input type=\"{kind}\" name=\"{}\" value=\"{}\"></label>\n",
        html_escape(name),
        html_escape(value)
    )
}

/// The add-contact form.
pub fn add_page() -> String {
    let mut body = String::from(
        "<h1>Add contact</h1>\n<form method=\"post\" action=\"/contacts/add\">\n",
    );
    body.push_str(&input("Given name", new_fields::GIVEN_NAME, "text", ""));
    body.push_str(&input("Family name", new_fields::FAMILY_NAME, "text", ""));
    body.push_str(&input("Email", new_fields::EMAIL, "email", ""));
    body.push_str(&input("Phone", new_fields::PHONE, "tel", ""));
    body.push_str(&input("Organization", new_fields::ORGANIZATION, "text", ""));
    body.push_str(
        "<button type=\"submit\">Save</button> <a href=\"/contacts\">Cancel</a>\n</form>",
    );
    layout("Add contact", &body)
}

/// The edit form, pre-filled from `contact`.
pub fn edit_page(contact: &ContactRecord) -> String {
    let name = contact.name();
    let email = contact.email().and_then(|e| e.value.as_deref());
    let phone = contact.phone().and_then(|p| p.value.as_deref());
    let organization = contact.organization().and_then(|o| o.name.as_deref());

    let mut body = format!(
        "<h1>Edit {}</h1>\n<form method=\"post\" action=\"/contacts/edit\">\n\
         <input type=\"hidden\" name=\"{}\" value=\"{}\">\n\
         <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
        html_escape(&contact.display_name()),
        fields::RESOURCE_NAME,
        html_escape(&contact.resource_name),
        fields::ETAG,
        html_escape(contact.etag.as_deref().unwrap_or_default()),
    );
    body.push_str(&input(
        "Given name",
        fields::GIVEN_NAME,
        "text",
        name.map(|n| n.given()).unwrap_or_default(),
    ));
    body.push_str(&input(
        "Family name",
        fields::FAMILY_NAME,
        "text",
        name.map(|n| n.family()).unwrap_or_default(),
    ));
    body.push_str(&input("Email", fields::EMAIL, "email", email.unwrap_or_default()));
    body.push_str(&input("Phone", fields::PHONE, "tel", phone.unwrap_or_default()));
    body.push_str(&input(
        "Organization",
        fields::ORGANIZATION,
        "text",
        organization.unwrap_or_default(),
    ));
    body.push_str(
        "<button type=\"submit\">Save</button> <a href=\"/contacts\">Cancel</a>\n</form>",
    );
    layout("Edit contact", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactmgr_core::{EmailAddress, Name, PhoneNumber};

    fn user() -> UserInfo {
        UserInfo {
            sub: "42".to_string(),
            name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            picture: Some("https://example.com/ada.png".to_string()),
        }
    }

    #[test]
    fn escape_special_characters() {
        insta::assert_snapshot!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            @"&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }

    #[test]
    fn contact_list_shows_user_and_flash() {
        let contacts = vec![
            ContactRecord::new("people/c1", "e1")
                .with_name(Name::new("Grace", "Hopper"))
                .with_email(EmailAddress::new("grace@example.com")),
        ];
        let html = contacts_page(&user(), &contacts, Some(&Flash::success("Contact deleted successfully")));

        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("src=\"https://example.com/ada.png\""));
        assert!(html.contains("<p class=\"flash-success\">Contact deleted successfully</p>"));
        assert!(html.contains("Grace Hopper"));
        assert!(html.contains("href=\"/contacts/edit/people/c1\""));
        assert!(html.contains("action=\"/contacts/people/c1\""));
        assert!(html.contains("name=\"_method\" value=\"DELETE\""));
    }

    #[test]
    fn empty_list() {
        let html = contacts_page(&user(), &[], Some(&Flash::error("Failed to delete contact")));
        assert!(html.contains("No contacts found."));
        assert!(html.contains("class=\"flash-error\""));
    }

    #[test]
    fn edit_form_is_prefilled() {
        let contact = ContactRecord::new("people/c1", "etag-1")
            .with_name(Name::new("Grace", "<Hopper>"))
            .with_phone(PhoneNumber::new("555-0100"));
        let html = edit_page(&contact);

        assert!(html.contains("name=\"resourceName\" value=\"people/c1\""));
        assert!(html.contains("name=\"etag\" value=\"etag-1\""));
        assert!(html.contains("name=\"names[0].givenName\" value=\"Grace\""));
        assert!(html.contains("name=\"names[0].familyName\" value=\"&lt;Hopper&gt;\""));
        assert!(html.contains("name=\"phoneNumbers[0].value\" value=\"555-0100\""));
        assert!(html.contains("name=\"organizations[0].name\" value=\"\""));
    }

    #[test]
    fn add_form_field_names() {
        let html = add_page();
        for name in ["givenName", "familyName", "email", "phone", "organization"] {
            assert!(html.contains(&format!("name=\"{name}\"")), "missing {name}");
        }
    }

    #[test]
    fn login_and_index_pages() {
        assert!(login_page(false).contains("/oauth2/authorization/google"));
        assert!(login_page(true).contains("Sign-in failed"));
        assert!(index_page(None).contains("href=\"/contacts/login\""));
        assert!(index_page(Some(&user())).contains("action=\"/logout\""));
    }

    #[test]
    fn error_page_escapes_message() {
        let html = error_page("<script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
