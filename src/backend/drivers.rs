//! Package manager command builders
//!
//! Drivers are pure: they only assemble the shell commands that run
//! inside a container. Executing them is the runtime's job, deciding
//! which driver applies to an image is the classifier's.

/// Command builder for one package manager family.
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Stable name, doubles as the cache bucket key.
    fn name(&self) -> &'static str;

    /// Command probed inside a throwaway container to test whether this
    /// package manager exists in an image. Exit status is the answer.
    fn detect_command(&self) -> &'static str;

    /// Command applying every pending update.
    fn general_update(&self) -> String;

    /// Command applying security updates only.
    fn security_update(&self) -> String;

    /// Command listing pending updates. `machine` asks for quiet,
    /// parseable output instead of the human-readable flavor.
    fn list_general_updates(&self, machine: bool) -> String;

    /// Command listing pending security updates.
    fn list_security_updates(&self, machine: bool) -> String;

    /// Whether the given exit code of an update command is a real
    /// failure. Some package managers reserve codes for benign
    /// conditions such as "updates available".
    fn is_exit_code_severe(&self, code: i32) -> bool;
}

/// The Debian family. apt has no security-only channel inside a plain
/// container, so security and general updates are the same command.
#[derive(Debug)]
pub struct Apt;

impl Driver for Apt {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn detect_command(&self) -> &'static str {
        "apt-get --version"
    }

    fn general_update(&self) -> String {
        self.security_update()
    }

    fn security_update(&self) -> String {
        "apt-get -qq -y update && apt-get -y -V upgrade && apt-get clean -qq -y".to_string()
    }

    fn list_general_updates(&self, machine: bool) -> String {
        self.list_security_updates(machine)
    }

    fn list_security_updates(&self, machine: bool) -> String {
        let flags = if machine {
            "--just-print -q"
        } else {
            "--just-print -V"
        };
        format!("apt-get -y update && apt-get {} upgrade", flags)
    }

    fn is_exit_code_severe(&self, code: i32) -> bool {
        code != 0
    }
}

/// The SUSE family.
#[derive(Debug)]
pub struct Zypper;

impl Driver for Zypper {
    fn name(&self) -> &'static str {
        "zypper"
    }

    fn detect_command(&self) -> &'static str {
        "zypper --version"
    }

    fn general_update(&self) -> String {
        "zypper ref && zypper -n up -l -y".to_string()
    }

    fn security_update(&self) -> String {
        "zypper ref && zypper -n patch -g security".to_string()
    }

    fn list_general_updates(&self, machine: bool) -> String {
        if machine {
            "zypper -q -n lu".to_string()
        } else {
            "zypper -n lu".to_string()
        }
    }

    fn list_security_updates(&self, machine: bool) -> String {
        if machine {
            "zypper -q -n lp -g security".to_string()
        } else {
            "zypper -n lp -g security".to_string()
        }
    }

    fn is_exit_code_severe(&self, code: i32) -> bool {
        // 100-104 report conditions like "patches available", not errors.
        !(code == 0 || (100..=104).contains(&code))
    }
}

/// The Fedora/RHEL family.
#[derive(Debug)]
pub struct Dnf;

// dnf reserves exit code 100 for "updates available".
const DNF_EXIT_UPDATE_NEEDED: i32 = 100;

impl Driver for Dnf {
    fn name(&self) -> &'static str {
        "dnf"
    }

    fn detect_command(&self) -> &'static str {
        "dnf --version"
    }

    fn general_update(&self) -> String {
        self.security_update()
    }

    fn security_update(&self) -> String {
        "dnf --allowerasing --best -v -y --refresh upgrade && dnf -q -y clean all".to_string()
    }

    fn list_general_updates(&self, machine: bool) -> String {
        self.list_security_updates(machine)
    }

    fn list_security_updates(&self, machine: bool) -> String {
        let extra = if machine { "-q" } else { "-v" };
        format!("dnf --allowerasing --best -y --refresh {} check-update", extra)
    }

    fn is_exit_code_severe(&self, code: i32) -> bool {
        code != 0 && code != DNF_EXIT_UPDATE_NEEDED
    }
}

/// Registered drivers in probe order. The order is fixed so that
/// classification is deterministic across invocations.
pub fn registered() -> &'static [&'static dyn Driver] {
    &[&Apt, &Zypper, &Dnf]
}

/// Look a driver up by its cache bucket name.
pub fn by_name(name: &str) -> Option<&'static dyn Driver> {
    registered().iter().find(|d| d.name() == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_order_is_fixed() {
        let names: Vec<_> = registered().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["apt", "zypper", "dnf"]);
    }

    #[test]
    fn by_name_resolves_registered_drivers() {
        assert_eq!(by_name("dnf").unwrap().name(), "dnf");
        assert!(by_name("pacman").is_none());
    }

    #[test]
    fn apt_update_commands() {
        assert_eq!(Apt.general_update(), Apt.security_update());
        assert!(Apt.general_update().starts_with("apt-get -qq -y update"));
        assert!(Apt.list_general_updates(true).contains("--just-print -q"));
        assert!(Apt.list_general_updates(false).contains("--just-print -V"));
    }

    #[test]
    fn dnf_exit_codes() {
        assert!(!Dnf.is_exit_code_severe(0));
        assert!(!Dnf.is_exit_code_severe(100));
        assert!(Dnf.is_exit_code_severe(1));
    }

    #[test]
    fn zypper_exit_codes() {
        assert!(!Zypper.is_exit_code_severe(0));
        assert!(!Zypper.is_exit_code_severe(103));
        assert!(Zypper.is_exit_code_severe(4));
    }
}
