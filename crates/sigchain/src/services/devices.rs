//! Device-related chain operations.

use rand::RngCore;

use sigchain_core::UserId;
use sigchain_team::{create_device, Device, DeviceWithSecrets};

use crate::chain::SigChain;
use crate::error::Result;

/// Random bytes in a generated device name.
const DEVICE_NAME_BYTES: usize = 6;

pub struct DeviceService<'a> {
    chain: &'a SigChain,
}

impl<'a> DeviceService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    /// Generate a new device for `user_id`, named after this machine.
    pub fn generate_device_for_user(user_id: UserId) -> DeviceWithSecrets {
        create_device(user_id, Self::determine_device_name())
    }

    /// A name for the current machine: the host name when the environment
    /// provides one, otherwise random hex.
    pub fn determine_device_name() -> String {
        std::env::var("HOSTNAME")
            .ok()
            .map(|h| h.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| {
                let mut bytes = [0u8; DEVICE_NAME_BYTES];
                rand::thread_rng().fill_bytes(&mut bytes);
                hex::encode(bytes)
            })
    }

    pub fn redact_device(device: &DeviceWithSecrets) -> Device {
        device.redact()
    }

    /// Devices the graph records for a member.
    pub fn devices_for_user(&self, user_id: &UserId) -> Result<Vec<Device>> {
        let team = self.chain.team();
        Ok(team.member(user_id)?.devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_founder_device_recorded() {
        let chain = SigChain::create("test", "user").unwrap();
        let context = chain.context();

        let devices = chain.devices().devices_for_user(&context.user.user_id).unwrap();
        assert_eq!(devices, vec![DeviceService::redact_device(&context.device)]);
    }

    #[test]
    fn test_generate_device() {
        let user_id = UserId::generate();
        let device = DeviceService::generate_device_for_user(user_id.clone());

        assert_eq!(device.user_id, user_id);
        assert!(!device.device_name.is_empty());

        let redacted = DeviceService::redact_device(&device);
        assert_eq!(redacted.device_name, device.device_name);
        assert_eq!(redacted.keys, device.keys.redact());
    }
}
