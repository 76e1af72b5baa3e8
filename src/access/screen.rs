//! Informational screens shown instead of gated content.

use crate::error::ResolutionError;
use crate::html::{document, escape};
use crate::model::verification_record_name;
use axum::http::StatusCode;
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateScreen {
    /// Unknown hostname, wrong surface, missing tenant or nothing to fall back to.
    NotFound { error: ResolutionError },
    /// Domain registered but its TXT record has not been confirmed yet.
    NotVerified { hostname: String, record_name: String },
    Inactive,
    Error,
    NotMember,
    LoginRequired,
}

impl GateScreen {
    pub fn for_resolution(error: ResolutionError, hostname: &str) -> Self {
        match error {
            ResolutionError::DomainNotVerified => GateScreen::NotVerified {
                hostname: hostname.to_string(),
                record_name: verification_record_name(hostname),
            },
            ResolutionError::TenantInactive => GateScreen::Inactive,
            ResolutionError::Lookup => GateScreen::Error,
            ResolutionError::DomainNotFound
            | ResolutionError::WrongDomainType
            | ResolutionError::TenantNotFound
            | ResolutionError::NoTenantAvailable => GateScreen::NotFound { error },
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GateScreen::NotFound { error } => error.code(),
            GateScreen::NotVerified { .. } => ResolutionError::DomainNotVerified.code(),
            GateScreen::Inactive => ResolutionError::TenantInactive.code(),
            GateScreen::Error => ResolutionError::Lookup.code(),
            GateScreen::NotMember => "NOT_A_MEMBER",
            GateScreen::LoginRequired => "LOGIN_REQUIRED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GateScreen::NotFound { error } => error.status(),
            GateScreen::NotVerified { .. } | GateScreen::Inactive | GateScreen::NotMember => StatusCode::FORBIDDEN,
            GateScreen::Error => StatusCode::SERVICE_UNAVAILABLE,
            GateScreen::LoginRequired => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GateScreen::NotFound { .. } => "Site não encontrado",
            GateScreen::NotVerified { .. } => "Domínio aguardando verificação",
            GateScreen::Inactive => "Conta inativa",
            GateScreen::Error => "Não foi possível carregar o site",
            GateScreen::NotMember => "Acesso não autorizado",
            GateScreen::LoginRequired => "Login necessário",
        }
    }

    pub fn message(&self) -> String {
        match self {
            GateScreen::NotFound { .. } => "Este endereço não está associado a nenhuma imobiliária.".into(),
            GateScreen::NotVerified { hostname, record_name } => format!(
                "O domínio {} ainda não foi verificado. Crie um registro TXT em {} com o token de verificação exibido no painel.",
                hostname, record_name
            ),
            GateScreen::Inactive => "Esta conta está inativa. Entre em contato com o administrador.".into(),
            GateScreen::Error => "Ocorreu um erro ao identificar o site. Recarregue a página em instantes.".into(),
            GateScreen::NotMember => "Sua conta não faz parte desta imobiliária.".into(),
            GateScreen::LoginRequired => "Entre com sua conta para acessar o painel.".into(),
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GateScreen::NotVerified { hostname, record_name } => Some(json!({
                "hostname": hostname,
                "record_type": "TXT",
                "record_name": record_name
            })),
            GateScreen::NotMember => Some(json!({ "logout": { "method": "POST", "path": "/auth/logout" } })),
            _ => None,
        }
    }

    pub fn render_html(&self) -> String {
        let mut body = format!(
            "<main class=\"gate gate-{}\">\n<h1>{}</h1>\n<p>{}</p>\n",
            self.code().to_lowercase(),
            escape(self.title()),
            escape(&self.message())
        );
        if let GateScreen::NotVerified { record_name, .. } = self {
            body.push_str(&format!(
                "<table class=\"dns\">\n<tr><th>Tipo</th><td>TXT</td></tr>\n<tr><th>Nome</th><td><code>{}</code></td></tr>\n</table>\n",
                escape(record_name)
            ));
        }
        if let GateScreen::NotMember = self {
            body.push_str("<form method=\"post\" action=\"/auth/logout\"><button type=\"submit\">Sair</button></form>\n");
        }
        body.push_str(&format!("<p class=\"code\"><code>{}</code></p>\n</main>", self.code()));
        document(self.title(), "", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_screen_names_the_txt_record() {
        let screen = GateScreen::for_resolution(ResolutionError::DomainNotVerified, "painel.example.com");
        assert_eq!(screen.code(), "DOMAIN_NOT_VERIFIED");
        assert_eq!(screen.status(), StatusCode::FORBIDDEN);
        let html = screen.render_html();
        assert!(html.contains("_zatch-verify.painel.example.com"));
        assert!(html.contains("DOMAIN_NOT_VERIFIED"));
    }

    #[test]
    fn not_found_family_keeps_its_code() {
        for e in [
            ResolutionError::DomainNotFound,
            ResolutionError::WrongDomainType,
            ResolutionError::TenantNotFound,
            ResolutionError::NoTenantAvailable,
        ] {
            let screen = GateScreen::for_resolution(e, "x.example.com");
            assert_eq!(screen.code(), e.code());
            assert!(screen.render_html().contains(e.code()));
        }
    }

    #[test]
    fn not_member_offers_logout() {
        assert!(GateScreen::NotMember.render_html().contains("action=\"/auth/logout\""));
    }
}
