use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub max_body_size: usize,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub admin_seed: Option<AdminSeed>,
}

/// Credentials for the admin account created on first start.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("ESTATELY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ESTATELY_HOST: {e}"))?;

        let port: u16 = env_or("ESTATELY_PORT", "5000")
            .parse()
            .map_err(|e| format!("Invalid ESTATELY_PORT: {e}"))?;

        let log_level = env_or("ESTATELY_LOG_LEVEL", "info");

        let access_token_minutes: i64 = env_or("ESTATELY_ACCESS_TOKEN_MINUTES", "60")
            .parse()
            .map_err(|e| format!("Invalid ESTATELY_ACCESS_TOKEN_MINUTES: {e}"))?;

        let refresh_token_days: i64 = env_or("ESTATELY_REFRESH_TOKEN_DAYS", "30")
            .parse()
            .map_err(|e| format!("Invalid ESTATELY_REFRESH_TOKEN_DAYS: {e}"))?;

        if access_token_minutes <= 0 || refresh_token_days <= 0 {
            return Err("Token lifetimes must be positive".to_string());
        }

        let max_body_size: usize = env_or("ESTATELY_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid ESTATELY_MAX_BODY_SIZE: {e}"))?;

        let cors_origins = parse_list(&env_or("ESTATELY_CORS_ORIGINS", ""));

        let admin_seed = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: env_or("ADMIN_NAME", "Admin User"),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            log_level,
            access_token_minutes,
            refresh_token_days,
            max_body_size,
            cors_origins,
            admin_seed,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_blank_entries() {
        assert_eq!(
            parse_list(" http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }
}
