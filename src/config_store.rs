use std::{fmt, fs, path::Path};

use log::info;
use pest::Parser;
use pest_derive::Parser;

use crate::error::UpdateError;

#[derive(Parser)]
#[grammar = "grammars/conf.pest"]
struct ConfParser;

/// One `[name]` block of the config file.  Options keep the order they
/// were read in, keys are lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSection {
    pub name: String,
    options: Vec<(String, String)>,
}

impl ConfigSection {
    pub fn new(name: &str) -> Self {
        ConfigSection {
            name: name.to_string(),
            options: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.options
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overwrite the value if the key exists, append it otherwise.
    pub fn set(&mut self, key: &str, value: &str) {
        let key = key.to_lowercase();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.options.push((key, value.to_string())),
        }
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The whole config file, sections in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    sections: Vec<ConfigSection>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, UpdateError> {
        let content = fs::read_to_string(path).map_err(|source| UpdateError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Config::parse(&content)?;
        info!(
            "Read {} sections from {}",
            config.sections.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn parse(input: &str) -> Result<Config, UpdateError> {
        let file = ConfParser::parse(Rule::file, input)
            .map_err(|e| UpdateError::ConfigParse(e.to_string()))?
            .next()
            .ok_or_else(|| UpdateError::ConfigParse("empty parse tree".into()))?;

        let mut config = Config::default();
        for pair in file.into_inner() {
            match pair.as_rule() {
                Rule::header => {
                    let name = pair.into_inner().as_str().trim().to_string();
                    if config.has_section(&name) {
                        return Err(UpdateError::ConfigParse(format!(
                            "section [{}] appears more than once",
                            name
                        )));
                    }
                    config.sections.push(ConfigSection::new(&name));
                }
                Rule::option => {
                    let (line, _) = pair.line_col();
                    let mut inner = pair.into_inner();
                    let key = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
                    let value = inner.next().map(|p| p.as_str().trim()).unwrap_or_default();
                    let section = config.sections.last_mut().ok_or_else(|| {
                        UpdateError::ConfigParse(format!(
                            "option '{}' on line {} is outside of any section",
                            key, line
                        ))
                    })?;
                    if section.has_option(key) {
                        return Err(UpdateError::ConfigParse(format!(
                            "option '{}' appears more than once in section [{}]",
                            key, section.name
                        )));
                    }
                    section.set(key, value);
                }
                Rule::EOI => {}
                _ => unreachable!(),
            }
        }
        Ok(config)
    }

    /// Rewrite the file in place.  There is no temp file + rename, a crash
    /// halfway through the write leaves a truncated file behind.
    pub fn save(&self, path: &Path) -> Result<(), UpdateError> {
        fs::write(path, self.to_string()).map_err(|source| UpdateError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Section names in file order.
    pub fn sections(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.section(section).is_some_and(|s| s.has_option(key))
    }

    pub fn get(&self, section: &str, key: &str) -> Result<&str, UpdateError> {
        let s = self
            .section(section)
            .ok_or_else(|| UpdateError::MissingSection(section.to_string()))?;
        s.get(key).ok_or_else(|| UpdateError::MissingKey {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    /// Sections are never created here, only existing ones are modified.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), UpdateError> {
        let s = self
            .sections
            .iter_mut()
            .find(|s| s.name == section)
            .ok_or_else(|| UpdateError::MissingSection(section.to_string()))?;
        s.set(key, value);
        Ok(())
    }

    /// Swap an existing section for a new record with the same name.
    pub fn replace_section(&mut self, section: ConfigSection) -> Result<(), UpdateError> {
        let slot = self
            .sections
            .iter_mut()
            .find(|s| s.name == section.name)
            .ok_or_else(|| UpdateError::MissingSection(section.name.clone()))?;
        *slot = section;
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in section.options() {
                writeln!(f, "{} = {}", key, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, fs};

    use super::*;

    const INPUTS: &str = r#"# managed by the update job
[rest://Property A]
endpoint = https://portfoliomanager.energystar.gov/ws/property/12345/metrics?year=2024&month=1
polling_interval = 0 0 5 31 2 ?
auth_user = alice
auth_password = s3cret

[rest://WeatherTest3]
Endpoint: https://weather.example.com/api
polling_interval = 3600
"#;

    #[test]
    fn parse_sections_and_options() -> Result<(), Box<dyn Error>> {
        let config = Config::parse(INPUTS)?;
        assert_eq!(
            config.sections(),
            vec!["rest://Property A", "rest://WeatherTest3"]
        );
        assert_eq!(
            config.get("rest://Property A", "endpoint")?,
            "https://portfoliomanager.energystar.gov/ws/property/12345/metrics?year=2024&month=1"
        );
        assert_eq!(
            config.get("rest://Property A", "polling_interval")?,
            "0 0 5 31 2 ?"
        );
        // keys are case insensitive, ':' works as a delimiter
        assert!(config.has_option("rest://WeatherTest3", "endpoint"));
        assert!(config.has_option("rest://WeatherTest3", "ENDPOINT"));
        assert!(!config.has_option("rest://WeatherTest3", "auth_user"));
        assert!(config.has_section("rest://WeatherTest3"));
        assert!(!config.has_section("rest://Property B"));
        Ok(())
    }

    #[test]
    fn missing_key_and_section() -> Result<(), Box<dyn Error>> {
        let mut config = Config::parse(INPUTS)?;
        assert!(matches!(
            config.get("rest://WeatherTest3", "auth_user"),
            Err(UpdateError::MissingKey { .. })
        ));
        assert!(matches!(
            config.get("nope", "endpoint"),
            Err(UpdateError::MissingSection(_))
        ));
        assert!(matches!(
            config.set("nope", "endpoint", "x"),
            Err(UpdateError::MissingSection(_))
        ));
        Ok(())
    }

    #[test]
    fn set_overwrites_instead_of_appending() -> Result<(), Box<dyn Error>> {
        let mut config = Config::parse(INPUTS)?;
        config.set("rest://Property A", "polling_interval", "999999")?;
        config.set("rest://Property A", "polling_interval", "60")?;
        let section = config.section("rest://Property A").unwrap();
        let n = section
            .options()
            .filter(|(k, _)| *k == "polling_interval")
            .count();
        assert_eq!(n, 1);
        assert_eq!(section.get("polling_interval"), Some("60"));
        Ok(())
    }

    #[test]
    fn rejects_bad_files() {
        // option before any header
        assert!(matches!(
            Config::parse("endpoint = x\n[a]\n"),
            Err(UpdateError::ConfigParse(_))
        ));
        // duplicate section
        assert!(matches!(
            Config::parse("[a]\nx = 1\n[a]\nx = 2\n"),
            Err(UpdateError::ConfigParse(_))
        ));
        // duplicate option
        assert!(matches!(
            Config::parse("[a]\nx = 1\nX = 2\n"),
            Err(UpdateError::ConfigParse(_))
        ));
        // unterminated header
        assert!(matches!(
            Config::parse("[a\nx = 1\n"),
            Err(UpdateError::ConfigParse(_))
        ));
        // indented continuation line
        assert!(matches!(
            Config::parse("[a]\nx = 1\n    y = 2\n"),
            Err(UpdateError::ConfigParse(_))
        ));
    }

    #[test]
    fn empty_file_has_no_sections() -> Result<(), Box<dyn Error>> {
        assert!(Config::parse("")?.sections().is_empty());
        assert!(Config::parse("\n# only a comment\n\n")?.sections().is_empty());
        // indented comments and blank lines with spaces are fine
        let config = Config::parse("[a]\n  # note\n   \nx = 1\n")?;
        assert_eq!(config.get("a", "x")?, "1");
        Ok(())
    }

    #[test]
    fn save_and_load() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("inputs.conf");
        fs::write(&path, INPUTS.replace('\n', "\r\n"))?;

        let mut config = Config::load(&path)?;
        config.set("rest://WeatherTest3", "polling_interval", "999999")?;
        config.save(&path)?;

        let content = fs::read_to_string(&path)?;
        assert!(content.starts_with("[rest://Property A]\nendpoint = https://"));
        assert!(content.contains("[rest://WeatherTest3]\nendpoint = https://weather.example.com/api\npolling_interval = 999999\n"));
        assert!(!content.contains("managed by"));
        assert_eq!(Config::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn load_missing_file() {
        let res = Config::load(Path::new("/definitely/not/here/inputs.conf"));
        assert!(matches!(res, Err(UpdateError::ConfigRead { .. })));
    }
}
