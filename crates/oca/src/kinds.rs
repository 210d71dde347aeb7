//! Standard OpenNebula resource kinds.
//!
//! Each kind only declares its XML root tags, remote method names, and the
//! field schema applied when an element is parsed.

use oca_core::{Entity, FieldDecl, Kind, MultiTags, Pool};
use oca_xml::{NO_MULTI_TAGS, VM_TEMPLATE_TAGS};

/// Repeatable tags of a virtual network lease block.
pub const LEASE_TAGS: MultiTags = &["LEASE"];

/// Virtual machine.
#[derive(Debug, Clone, Copy)]
pub struct VmKind;

impl Kind for VmKind {
    const ELEMENT_NAME: &'static str = "VM";
    const POOL_NAME: &'static str = "VM_POOL";
    const INFO_METHOD: &'static str = "vm.info";
    const DELETE_METHOD: &'static str = "vm.delete";
    const POOL_INFO_METHOD: &'static str = "vmpool.info";
    const SCHEMA: &'static [FieldDecl] = &[
        FieldDecl::int("id"),
        FieldDecl::int("uid"),
        FieldDecl::text("name"),
        FieldDecl::int("last_poll"),
        FieldDecl::int("state"),
        FieldDecl::int("lcm_state"),
        FieldDecl::int("stime"),
        FieldDecl::int("etime"),
        FieldDecl::int("memory"),
        FieldDecl::int("cpu"),
        FieldDecl::int("net_tx"),
        FieldDecl::int("net_rx"),
        FieldDecl::template("template", "TEMPLATE", VM_TEMPLATE_TAGS),
    ];
}

/// Physical host.
#[derive(Debug, Clone, Copy)]
pub struct HostKind;

impl Kind for HostKind {
    const ELEMENT_NAME: &'static str = "HOST";
    const POOL_NAME: &'static str = "HOST_POOL";
    const INFO_METHOD: &'static str = "host.info";
    const DELETE_METHOD: &'static str = "host.delete";
    const POOL_INFO_METHOD: &'static str = "hostpool.info";
    const SCHEMA: &'static [FieldDecl] = &[
        FieldDecl::int("id"),
        FieldDecl::text("name"),
        FieldDecl::int("state"),
        FieldDecl::text("im_mad"),
        FieldDecl::text("vm_mad"),
        FieldDecl::text("tm_mad"),
        FieldDecl::int("last_mon_time"),
        FieldDecl::template("template", "TEMPLATE", NO_MULTI_TAGS),
        FieldDecl::template("host_share", "HOST_SHARE", NO_MULTI_TAGS),
    ];
}

/// Disk image registered in the image repository.
#[derive(Debug, Clone, Copy)]
pub struct ImageKind;

impl Kind for ImageKind {
    const ELEMENT_NAME: &'static str = "IMAGE";
    const POOL_NAME: &'static str = "IMAGE_POOL";
    const INFO_METHOD: &'static str = "image.info";
    const DELETE_METHOD: &'static str = "image.delete";
    const POOL_INFO_METHOD: &'static str = "imagepool.info";
    const SCHEMA: &'static [FieldDecl] = &[
        FieldDecl::int("id"),
        FieldDecl::int("uid"),
        FieldDecl::text("name"),
        FieldDecl::int("type"),
        FieldDecl::int("public"),
        FieldDecl::int("persistent"),
        FieldDecl::int("regtime"),
        FieldDecl::text("source"),
        FieldDecl::int("state"),
        FieldDecl::int("running_vms"),
        FieldDecl::template("template", "TEMPLATE", NO_MULTI_TAGS),
    ];
}

/// Virtual network.
#[derive(Debug, Clone, Copy)]
pub struct VnetKind;

impl Kind for VnetKind {
    const ELEMENT_NAME: &'static str = "VNET";
    const POOL_NAME: &'static str = "VNET_POOL";
    const INFO_METHOD: &'static str = "vn.info";
    const DELETE_METHOD: &'static str = "vn.delete";
    const POOL_INFO_METHOD: &'static str = "vnpool.info";
    const SCHEMA: &'static [FieldDecl] = &[
        FieldDecl::int("id"),
        FieldDecl::int("uid"),
        FieldDecl::text("name"),
        FieldDecl::text("bridge"),
        FieldDecl::int("public"),
        FieldDecl::int("total_leases"),
        FieldDecl::template("template", "TEMPLATE", NO_MULTI_TAGS),
        FieldDecl::template("leases", "LEASES", LEASE_TAGS),
    ];
}

/// User account.
#[derive(Debug, Clone, Copy)]
pub struct UserKind;

impl Kind for UserKind {
    const ELEMENT_NAME: &'static str = "USER";
    const POOL_NAME: &'static str = "USER_POOL";
    const INFO_METHOD: &'static str = "user.info";
    const DELETE_METHOD: &'static str = "user.delete";
    const POOL_INFO_METHOD: &'static str = "userpool.info";
    const SCHEMA: &'static [FieldDecl] = &[
        FieldDecl::int("id"),
        FieldDecl::text("name"),
        FieldDecl::text("password"),
        FieldDecl::text("enabled"),
    ];
}

pub type Vm<'c> = Entity<'c, VmKind>;
pub type VmPool<'c> = Pool<'c, VmKind>;
pub type Host<'c> = Entity<'c, HostKind>;
pub type HostPool<'c> = Pool<'c, HostKind>;
pub type Image<'c> = Entity<'c, ImageKind>;
pub type ImagePool<'c> = Pool<'c, ImageKind>;
pub type Vnet<'c> = Entity<'c, VnetKind>;
pub type VnetPool<'c> = Pool<'c, VnetKind>;
pub type User<'c> = Entity<'c, UserKind>;
pub type UserPool<'c> = Pool<'c, UserKind>;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use oca_core::{Arg, Field, OcaError, Transport, TransportError, XmlError};

    const VM_POOL: &str = r#"
        <VM_POOL>
            <VM>
                <ID>0</ID><UID>0</UID><NAME>vm-example</NAME><LAST_POLL>1277729095</LAST_POLL>
                <STATE>3</STATE><LCM_STATE>3</LCM_STATE><STIME>1277375180</STIME><ETIME>0</ETIME>
                <DEPLOY_ID>one-0</DEPLOY_ID><MEMORY>512</MEMORY><CPU>1</CPU>
                <NET_TX>12345</NET_TX><NET_RX>0</NET_RX>
                <TEMPLATE>
                    <CPU><![CDATA[1]]></CPU>
                    <DISK><SOURCE>/local/xen/domains/xen-etch/disk.img</SOURCE><TARGET>sda1</TARGET></DISK>
                    <DISK><SOURCE>/local/xen/domains/xen-etch/swap.img</SOURCE><TARGET>sda2</TARGET></DISK>
                    <NIC><BRIDGE>eth0</BRIDGE><IP>192.168.0.1</IP><MAC>02:00:c0:a8:00:01</MAC></NIC>
                    <MEMORY>512</MEMORY>
                    <NAME>vm-example</NAME>
                    <VMID>0</VMID>
                </TEMPLATE>
                <HISTORY><HOSTNAME>dummyhost</HOSTNAME><SEQ>0</SEQ></HISTORY>
            </VM>
            <VM>
                <ID>2</ID><UID>1</UID><NAME>second</NAME><STATE>7</STATE><LCM_STATE>0</LCM_STATE>
                <TEMPLATE><MEMORY>256</MEMORY></TEMPLATE>
            </VM>
        </VM_POOL>
    "#;

    struct Canned {
        response: String,
        calls: RefCell<Vec<String>>,
    }

    impl Canned {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn call(&self, method: &str, _args: &[Arg]) -> Result<String, TransportError> {
            self.calls.borrow_mut().push(method.to_string());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn vm_pool_declared_fields_and_template() {
        let transport = Canned::new(VM_POOL);
        let mut pool = VmPool::new(&transport);
        pool.refresh(&[Arg::Int(-2)]).expect("refresh vm pool");
        assert_eq!(transport.calls.borrow().as_slice(), ["vmpool.info"]);
        assert_eq!(pool.len(), 2);

        let vm = pool.find_by_name("vm-example").expect("vm by name");
        assert_eq!(vm.get("memory").unwrap(), Field::Int(512));
        assert_eq!(vm.get("net_tx").unwrap(), Field::Int(12345));
        assert_eq!(vm.get_str("deploy_id").unwrap(), "one-0");

        let template = vm.template("template").expect("template");
        let disks = template.sequence("disks").expect("disks");
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].get("target").unwrap(), "sda1");
        assert_eq!(disks[1].get("target").unwrap(), "sda2");
        let nics = template.sequence("nics").expect("nics");
        assert_eq!(nics[0].get("ip").unwrap(), "192.168.0.1");
        assert_eq!(template.get("vmid").unwrap(), "0");

        let second = pool.find_by_id(2).expect("vm by id");
        assert!(second.template("template").unwrap().sequence("disks").unwrap().is_empty());
        assert!(matches!(second.get("net_tx"), Err(OcaError::Xml(XmlError::FieldNotFound(_)))));
    }

    #[test]
    fn host_info_with_share_block() {
        let transport = Canned::new(
            r#"<HOST>
                <ID>1</ID><NAME>node01</NAME><STATE>2</STATE>
                <IM_MAD>im_kvm</IM_MAD><VM_MAD>vmm_kvm</VM_MAD><TM_MAD>tm_nfs</TM_MAD>
                <LAST_MON_TIME>1277733596</LAST_MON_TIME>
                <HOST_SHARE><MAX_MEM>1048576</MAX_MEM><RUNNING_VMS>3</RUNNING_VMS></HOST_SHARE>
                <TEMPLATE><ARCH>x86_64</ARCH><HYPERVISOR>kvm</HYPERVISOR></TEMPLATE>
            </HOST>"#,
        );
        let mut host = Host::new_with_id(&transport, 1).expect("host");
        host.refresh().expect("refresh host");
        assert_eq!(transport.calls.borrow().as_slice(), ["host.info"]);
        assert_eq!(host.name().unwrap(), "node01");
        assert_eq!(host.get_str("vm_mad").unwrap(), "vmm_kvm");
        assert_eq!(host.get_int("last_mon_time").unwrap(), 1277733596);
        let share = host.template("host_share").expect("host share");
        assert_eq!(share.get("running_vms").unwrap(), "3");
        assert_eq!(host.template("template").unwrap().get("arch").unwrap(), "x86_64");
    }

    #[test]
    fn vnet_leases_are_a_sequence() {
        let transport = Canned::new(
            r#"<VNET_POOL>
                <VNET>
                    <ID>4</ID><UID>0</UID><NAME>public</NAME><BRIDGE>br0</BRIDGE>
                    <PUBLIC>1</PUBLIC><TOTAL_LEASES>2</TOTAL_LEASES>
                    <TEMPLATE><TYPE>FIXED</TYPE></TEMPLATE>
                    <LEASES>
                        <LEASE><IP>10.0.0.1</IP><USED>1</USED><VID>12</VID></LEASE>
                        <LEASE><IP>10.0.0.2</IP><USED>0</USED><VID>-1</VID></LEASE>
                    </LEASES>
                </VNET>
            </VNET_POOL>"#,
        );
        let mut pool = VnetPool::new(&transport);
        pool.refresh(&[]).expect("refresh vnet pool");
        let vnet = pool.find_by_id(4).expect("vnet");
        let leases = vnet.template("leases").expect("leases");
        let ips: Vec<_> = leases
            .sequence("leases")
            .expect("lease list")
            .iter()
            .map(|lease| lease.get("ip").unwrap())
            .collect();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(vnet.get_int("total_leases").unwrap(), 2);
    }

    #[test]
    fn image_and_user_lifecycle_methods() {
        let transport = Canned::new("<IMAGE><ID>3</ID></IMAGE>");
        let image = Image::new_with_id(&transport, 3).expect("image");
        image.delete().expect("delete image");
        let user = User::new_with_id(&transport, 5).expect("user");
        user.delete().expect("delete user");
        assert_eq!(
            transport.calls.borrow().as_slice(),
            ["image.delete", "user.delete"]
        );
    }

    #[test]
    fn pool_of_wrong_kind_is_rejected() {
        let transport = Canned::new(VM_POOL);
        let mut pool = ImagePool::new(&transport);
        let err = pool.refresh(&[]).unwrap_err();
        assert!(matches!(err, OcaError::Xml(XmlError::InvalidRoot { .. })));
        assert!(pool.is_empty());
    }
}
