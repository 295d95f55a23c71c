//! Manual-only services: no rotation call to make, only a human procedure
//! to print.

/// A service whose credentials can only be rotated by a person.
pub struct ManualRotation {
    service: &'static str,
    instructions: &'static str,
}

impl ManualRotation {
    pub fn new(service: &'static str, instructions: &'static str) -> Self {
        Self {
            service,
            instructions,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn instructions(&self) -> &'static str {
        self.instructions
    }
}

/// GitHub PATs cannot be rotated via the API without an OAuth or GitHub App.
pub(crate) fn github() -> ManualRotation {
    ManualRotation {
        service: "github",
        instructions: "\
Manual rotation required for GitHub PAT:

1. Go to: https://github.com/settings/tokens
2. Click \"Generate new token\" (fine-grained recommended)
3. Set an expiration and select the required permissions
4. Generate and copy the new token
5. Update every tracked location with the new value
6. Run: tokn update <name> --expiry-days <days>",
    }
}

pub(crate) fn postman() -> ManualRotation {
    ManualRotation {
        service: "postman",
        instructions: "\
Manual rotation required for Postman API Key:

1. Go to: https://go.postman.co/settings/me/api-keys
2. Click \"...\" next to your key, then \"Regenerate API Key\"
3. Copy the new key
4. Update every tracked location with the new value
5. Run: tokn update <name> --expiry-days <days>",
    }
}

pub(crate) fn terraform_account() -> ManualRotation {
    ManualRotation {
        service: "terraform-account",
        instructions: "\
Manual rotation required for HCP Terraform Account Token:

1. Run: terraform login
2. Follow the OAuth flow in the browser
3. The token is saved to ~/.terraform.d/credentials.tfrc.json
4. Run: tokn update <name> --expiry-days <days>",
    }
}

/// Generic fallback for untracked/custom services. Users can keep
/// service-specific steps in the token's notes field.
pub(crate) fn other() -> ManualRotation {
    ManualRotation {
        service: "other",
        instructions: "\
Manual rotation required for this custom service.

Check the token's notes field for service-specific instructions:
  tokn describe <name>

General steps:
1. Rotate the credential via the service's console or API
2. Update every tracked location with the new value
3. Run: tokn update <name> --expiry-days <days>",
    }
}
