use super::{IconImage, TITLE};
use crate::shutdown::{ShutdownSignal, ShutdownTrigger};
use anyhow::Result;
use std::time::Duration;
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem},
    Icon, TrayIcon, TrayIconBuilder,
};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Quit,
}

pub struct SystemTray {
    _tray: TrayIcon,
    quit_id: MenuId,
}

impl SystemTray {
    pub fn new(image: IconImage) -> Result<Self> {
        let quit_item = MenuItem::new("Quit", true, None);
        let quit_id = quit_item.id().clone();

        let menu = Menu::new();
        menu.append(&quit_item)?;

        let icon = Icon::from_rgba(image.rgba, image.width, image.height)?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(TITLE)
            .with_title(TITLE)
            .with_icon(icon)
            .build()?;

        Ok(Self {
            _tray: tray,
            quit_id,
        })
    }

    pub fn poll(&self) -> Option<TrayAction> {
        if let Ok(event) = MenuEvent::receiver().try_recv() {
            if event.id == self.quit_id {
                return Some(TrayAction::Quit);
            }
        }
        None
    }
}

/// Owns the tray on this thread and pumps its window messages until shutdown.
pub fn run(image: IconImage, trigger: &ShutdownTrigger, signal: &ShutdownSignal) -> Result<()> {
    let tray = SystemTray::new(image)?;

    while !signal.is_triggered() {
        pump_messages();
        if let Some(TrayAction::Quit) = tray.poll() {
            tracing::info!("Quit requested from tray");
            trigger.trigger();
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    Ok(())
}

fn pump_messages() {
    let mut msg = MSG::default();
    // SAFETY: `msg` outlives every call that reads or writes it.
    unsafe {
        while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
