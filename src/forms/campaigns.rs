use serde::Deserialize;
use validator::Validate;

use crate::domain::campaign::{
    CampaignFields, DEFAULT_TEMPLATE_LANGUAGE, MAX_RECIPIENTS, NewRecipient,
    normalize_whatsapp_phone,
};
use crate::domain::types::{CampaignName, ClientId};
use crate::forms::{FormError, clean};

#[derive(Debug, Deserialize, Validate)]
pub struct CampaignForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub template_name: String,
    pub language: Option<String>,
    pub recipients: Option<Vec<RecipientForm>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipientForm {
    pub client_id: Option<i32>,
    pub phone: String,
    pub name: Option<String>,
}

impl CampaignForm {
    pub fn fields(&self) -> Result<CampaignFields, FormError> {
        Ok(CampaignFields {
            name: CampaignName::new(self.name.as_str())?,
            template_name: self.template_name.trim().to_string(),
            language: clean(&self.language)
                .unwrap_or_else(|| DEFAULT_TEMPLATE_LANGUAGE.to_string()),
        })
    }

    /// Normalized recipients; `None` when the payload omits the list.
    pub fn recipients(&self) -> Result<Option<Vec<NewRecipient>>, FormError> {
        self.recipients.as_deref().map(normalize_recipients).transpose()
    }
}

pub fn normalize_recipients(recipients: &[RecipientForm]) -> Result<Vec<NewRecipient>, FormError> {
    if recipients.is_empty() || recipients.len() > MAX_RECIPIENTS {
        return Err(FormError::Invalid(format!(
            "A campanha deve ter entre 1 e {MAX_RECIPIENTS} destinatários"
        )));
    }
    recipients
        .iter()
        .map(|recipient| {
            let phone = normalize_whatsapp_phone(&recipient.phone);
            if phone.len() < 12 {
                return Err(FormError::Invalid(format!(
                    "Telefone inválido: {}",
                    recipient.phone
                )));
            }
            Ok(NewRecipient {
                client_id: recipient.client_id.map(ClientId::new).transpose()?,
                phone,
                name: clean(&recipient.name),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendTestForm {
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub template_name: String,
    pub language: Option<String>,
    #[serde(default)]
    pub variables: Vec<String>,
}
