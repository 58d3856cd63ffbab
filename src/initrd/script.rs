//! Guest `/init` boot script synthesis.
//!
//! Rendering is a pure function from the build mode (plus the staged
//! binary names) to script text, so both variants are testable without a
//! filesystem. The script always opens with the same network/device
//! preamble: the guest has no DHCP client and an empty `/dev` at boot,
//! so the address, route, and null device node are set up by hand before
//! anything mode-specific runs.

use tracing::info;

use crate::common::write_file_mode;
use crate::error::BuildError;
use crate::initrd::context::StagedNames;
use crate::initrd::split::PART_PREFIX;
use crate::initrd::{BuildContext, Mode};

/// Guest address on the host-side bridge network.
const GUEST_ADDR: &str = "192.168.50.10/24";
const GATEWAY_ADDR: &str = "192.168.50.1";

/// Name the reassembled rootfs archive takes inside the guest.
const ROOTFS_ARCHIVE: &str = "/bin/rootfs.tar";

/// Mount point the container root filesystem is extracted into.
const ROOTFS_MOUNT: &str = "/mnt/rootfs";

/// Render the init script for `mode`.
pub fn render(mode: &Mode, names: &StagedNames) -> String {
    let mut script = preamble();
    match mode {
        Mode::Code => script.push_str(&code_fragment(names)),
        Mode::Rootfs { .. } => script.push_str(&rootfs_fragment(names)),
    }
    script
}

/// Write the rendered script to `<staging>/init`.
///
/// The executable bit is set later by the packager, which owns the final
/// shape of the tree.
pub fn write(ctx: &BuildContext, script: &str) -> Result<(), BuildError> {
    let path = ctx.init_path();
    info!(tag = %ctx.request.tag, path = %path.display(), "writing init script");
    write_file_mode(&path, script, 0o644).map_err(|e| BuildError::Script {
        tag: ctx.request.tag.clone(),
        source: std::io::Error::other(format!("{e:#}")),
    })
}

fn preamble() -> String {
    format!(
        "#!/bin/sh\n\
         # Static network setup; the guest has no DHCP client.\n\
         busybox ip addr add {GUEST_ADDR} dev eth0\n\
         busybox ip link set eth0 up\n\
         busybox ip route add default via {GATEWAY_ADDR}\n\
         # /dev is empty at this point.\n\
         busybox mknod /dev/null c 1 3\n\
         busybox chmod 666 /dev/null\n"
    )
}

/// CODE mode: mount the pseudo filesystems, pick up the optional
/// persistent disk, start the vsock bridge, end in an interactive shell.
fn code_fragment(names: &StagedNames) -> String {
    format!(
        "busybox mkdir -p /proc /sys /dev /mnt\n\
         busybox mount -t proc none /proc\n\
         busybox mount -t sysfs none /sys\n\
         busybox mount -t devtmpfs none /dev\n\
         \n\
         # Optional scratch disk; missing or unmountable is fine.\n\
         if [ -b /dev/vda ]; then\n\
         \x20\x20busybox blockdev --setra 4096 /dev/vda || true\n\
         \x20\x20busybox mount -t ext4 -o noatime,nodiratime,commit=30 /dev/vda /mnt || true\n\
         fi\n\
         \n\
         /bin/{bridge}\n\
         exec /bin/sh\n",
        bridge = names.vsock_bridge,
    )
}

/// ROOTFS mode: reassemble and extract the container root filesystem,
/// make the helpers reachable inside it, then chroot into its init. The
/// chroot is the terminal state; control never returns to this script.
fn rootfs_fragment(names: &StagedNames) -> String {
    format!(
        "busybox mkdir -p /proc /sys {mnt}\n\
         busybox mount -t proc none /proc\n\
         busybox mount -t sysfs none /sys\n\
         \n\
         # Part files sort by name in byte-offset order.\n\
         busybox cat /bin/{prefix}* > {archive}\n\
         busybox rm /bin/{prefix}*\n\
         busybox tar -xpf {archive} -C {mnt}\n\
         \n\
         # busybox must stay reachable after the root change.\n\
         busybox cp /bin/busybox {mnt}/bin/\n\
         busybox chmod +x {mnt}/bin/busybox\n\
         busybox chroot {mnt} /bin/busybox --install -s /bin\n\
         \n\
         busybox cp /bin/qemu_init.sh {mnt}/bin/\n\
         busybox chmod +x {mnt}/bin/qemu_init.sh\n\
         \n\
         # Device nodes for the container tree.\n\
         busybox mount -t tmpfs none {mnt}/dev\n\
         busybox mdev -s\n\
         \n\
         busybox mv /bin/{bridge} {mnt}/bin/\n\
         busybox chmod +x {mnt}/bin/{bridge}\n\
         busybox mv /bin/{init} {mnt}/bin/\n\
         busybox chmod +x {mnt}/bin/{init}\n\
         \n\
         busybox chroot {mnt} /bin/{init}\n",
        mnt = ROOTFS_MOUNT,
        prefix = PART_PREFIX,
        archive = ROOTFS_ARCHIVE,
        bridge = names.vsock_bridge,
        init = names.container_init,
    )
}
